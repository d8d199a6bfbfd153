//! The storage the materializer runs against.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    family::{Family, FamilyCode, UserName, find_or_create_family},
    recurring::{
        db::{claim_rule_for_month, list_active_rules},
        models::RecurringRule,
    },
    transaction::{Transaction, create_transaction},
};

/// Handles the reads and writes needed to post recurring rules.
pub trait RecurringStore {
    /// Retrieve every active recurring rule.
    fn list_active_rules(&self) -> Result<Vec<RecurringRule>, Error>;

    /// Retrieve the family with `code`, creating it with `default_user` as the first member if
    /// it does not exist.
    fn find_or_create_family(
        &self,
        code: &FamilyCode,
        default_user: &UserName,
    ) -> Result<Family, Error>;

    /// Claim `rule` for the month of `today` and post its transaction dated `today`.
    ///
    /// Implementers must make the claim and the insert atomic: if the insert fails the rule
    /// stays unclaimed. Returns `None` if the rule was already claimed this month or is no
    /// longer active.
    fn materialize(&self, rule: &RecurringRule, today: Date) -> Result<Option<Transaction>, Error>;
}

/// A [RecurringStore] backed by the application's SQLite database.
#[derive(Debug, Clone, Copy)]
pub struct SqliteRecurringStore<'a> {
    connection: &'a Connection,
}

impl<'a> SqliteRecurringStore<'a> {
    /// Create a store over `connection`.
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl RecurringStore for SqliteRecurringStore<'_> {
    fn list_active_rules(&self) -> Result<Vec<RecurringRule>, Error> {
        list_active_rules(self.connection)
    }

    fn find_or_create_family(
        &self,
        code: &FamilyCode,
        default_user: &UserName,
    ) -> Result<Family, Error> {
        find_or_create_family(code, default_user, self.connection)
    }

    fn materialize(&self, rule: &RecurringRule, today: Date) -> Result<Option<Transaction>, Error> {
        let sql_transaction = self.connection.unchecked_transaction()?;

        if !claim_rule_for_month(rule.id, today, &sql_transaction)? {
            return Ok(None);
        }

        // Dropping the SQL transaction on error rolls back the claim.
        let transaction = create_transaction(rule.transaction_builder(today), &sql_transaction)?;
        sql_transaction.commit()?;

        Ok(Some(transaction))
    }
}
