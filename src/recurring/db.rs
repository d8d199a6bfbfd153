use rusqlite::{Connection, Row};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::RuleId,
    family::{FamilyCode, UserName},
    recurring::models::{NewRecurringRule, RecurringRule},
    transaction::Memo,
};

const RULE_COLUMNS: &str = "id, amount, category, memo, user_name, family_code, day_of_month, \
     is_active, created_at, last_processed, payment_method";

/// Create an active recurring rule in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_rule(rule: NewRecurringRule, connection: &Connection) -> Result<RecurringRule, Error> {
    let rule = connection
        .prepare(&format!(
            "INSERT INTO recurring_rule
                (amount, category, memo, user_name, family_code, day_of_month, is_active, \
                 created_at, payment_method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)
             RETURNING {RULE_COLUMNS}"
        ))?
        .query_row(
            (
                rule.amount,
                rule.category,
                rule.memo.as_ref().map(Memo::as_ref),
                rule.user_name.as_ref(),
                rule.family_code.as_ref(),
                rule.day_of_month,
                OffsetDateTime::now_utc(),
                rule.payment_method,
            ),
            map_rule_row,
        )?;

    tracing::info!(
        "Created recurring rule {} for family {} due on day {}",
        rule.id,
        rule.family_code,
        rule.day_of_month
    );

    Ok(rule)
}

/// Retrieve a recurring rule in the database by `rule_id`, whether it is active or not.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `rule_id` does not refer to a rule,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_rule(rule_id: RuleId, connection: &Connection) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule WHERE id = :id"
        ))?
        .query_one(&[(":id", &rule_id)], map_rule_row)
        .map_err(|error| error.into())
}

/// Retrieve every active recurring rule, oldest first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_active_rules(connection: &Connection) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule WHERE is_active = 1 ORDER BY id ASC"
        ))?
        .query_map([], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the active recurring rules of the family with `family_code`, newest first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_active_rules_for_family(
    family_code: &FamilyCode,
    connection: &Connection,
) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule
             WHERE family_code = :family_code AND is_active = 1
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(&[(":family_code", family_code.as_ref())], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Deactivate a recurring rule so that it is never posted again.
///
/// The row is kept so that transactions posted from the rule still refer to it.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRule] if there is no active rule with `rule_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn deactivate_rule(rule_id: RuleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_rule SET is_active = 0 WHERE id = ?1 AND is_active = 1",
        [rule_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    tracing::info!("Deactivated recurring rule {rule_id}");

    Ok(())
}

/// Mark the rule with `rule_id` as processed on `today`, unless it is inactive or was already
/// processed in the same calendar month.
///
/// The check and the write are a single statement, so two concurrent callers cannot both
/// claim the same rule for the same month.
///
/// Returns whether this call claimed the rule.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn claim_rule_for_month(
    rule_id: RuleId,
    today: Date,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_rule SET last_processed = ?2
         WHERE id = ?1
           AND is_active = 1
           AND (last_processed IS NULL
                OR strftime('%Y-%m', last_processed) <> strftime('%Y-%m', ?2))",
        (rule_id, today),
    )?;

    Ok(rows_affected == 1)
}

/// Create the recurring rule table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_rule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount INTEGER NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                memo TEXT,
                user_name TEXT NOT NULL,
                family_code TEXT NOT NULL,
                day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_processed TEXT,
                payment_method TEXT NOT NULL DEFAULT 'card'
            )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_rule_family_active
            ON recurring_rule(family_code, is_active)",
        (),
    )?;

    Ok(())
}

fn map_rule_row(row: &Row) -> Result<RecurringRule, rusqlite::Error> {
    let memo: Option<String> = row.get(3)?;
    let user_name: String = row.get(4)?;
    let family_code: String = row.get(5)?;

    Ok(RecurringRule {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        memo: memo.map(|memo| Memo::new_unchecked(&memo)),
        user_name: UserName::new_unchecked(&user_name),
        family_code: FamilyCode::new_unchecked(&family_code),
        day_of_month: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
        last_processed: row.get(9)?,
        payment_method: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::SpendingCategory,
        family::{FamilyCode, UserName},
        payment_method::PaymentMethod,
        recurring::models::{DayOfMonth, NewRecurringRule},
        test_utils::get_test_connection,
        transaction::{Amount, Memo},
    };

    use super::{
        claim_rule_for_month, create_rule, deactivate_rule, get_rule, list_active_rules,
        list_active_rules_for_family,
    };

    fn new_rule(family_code: &str, day: u8) -> NewRecurringRule {
        NewRecurringRule {
            amount: Amount::new_unchecked(550_000),
            category: SpendingCategory::HousingRent,
            memo: Some(Memo::new_unchecked("관리비")),
            user_name: UserName::new_unchecked("민지"),
            family_code: FamilyCode::new_unchecked(family_code),
            day_of_month: DayOfMonth::new_unchecked(day),
            payment_method: PaymentMethod::Transfer,
        }
    }

    fn insert(family_code: &str, day: u8, connection: &Connection) -> i64 {
        create_rule(new_rule(family_code, day), connection).unwrap().id
    }

    #[test]
    fn create_then_get() {
        let connection = get_test_connection();

        let created = create_rule(new_rule("park77", 25), &connection).unwrap();
        let got = get_rule(created.id, &connection).unwrap();

        assert_eq!(got, created);
        assert!(got.is_active);
        assert_eq!(got.last_processed, None);
        assert_eq!(got.day_of_month.get(), 25);
        assert_eq!(got.category, SpendingCategory::HousingRent);
        assert_eq!(got.payment_method, PaymentMethod::Transfer);
    }

    #[test]
    fn get_missing_rule_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_rule(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn lists_only_active_rules() {
        let connection = get_test_connection();
        let kept = insert("park77", 1, &connection);
        let removed = insert("park77", 2, &connection);
        let other = insert("lee88", 3, &connection);
        deactivate_rule(removed, &connection).unwrap();

        let all: Vec<_> = list_active_rules(&connection)
            .unwrap()
            .into_iter()
            .map(|rule| rule.id)
            .collect();
        let family: Vec<_> =
            list_active_rules_for_family(&FamilyCode::new_unchecked("park77"), &connection)
                .unwrap()
                .into_iter()
                .map(|rule| rule.id)
                .collect();

        assert_eq!(all, vec![kept, other]);
        assert_eq!(family, vec![kept]);
    }

    #[test]
    fn family_rules_are_newest_first() {
        let connection = get_test_connection();
        let first = insert("park77", 1, &connection);
        let second = insert("park77", 2, &connection);

        let ids: Vec<_> =
            list_active_rules_for_family(&FamilyCode::new_unchecked("park77"), &connection)
                .unwrap()
                .into_iter()
                .map(|rule| rule.id)
                .collect();

        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn deactivate_keeps_row() {
        let connection = get_test_connection();
        let id = insert("park77", 1, &connection);

        deactivate_rule(id, &connection).unwrap();

        assert!(!get_rule(id, &connection).unwrap().is_active);
        assert_eq!(
            deactivate_rule(id, &connection),
            Err(Error::DeleteMissingRule)
        );
        assert_eq!(
            deactivate_rule(id + 100, &connection),
            Err(Error::DeleteMissingRule)
        );
    }

    #[test]
    fn claim_once_per_month() {
        let connection = get_test_connection();
        let id = insert("park77", 5, &connection);

        assert_eq!(
            claim_rule_for_month(id, date!(2025 - 03 - 05), &connection),
            Ok(true)
        );
        assert_eq!(
            claim_rule_for_month(id, date!(2025 - 03 - 05), &connection),
            Ok(false)
        );
        assert_eq!(
            claim_rule_for_month(id, date!(2025 - 03 - 31), &connection),
            Ok(false)
        );
        assert_eq!(
            get_rule(id, &connection).unwrap().last_processed,
            Some(date!(2025 - 03 - 05))
        );

        assert_eq!(
            claim_rule_for_month(id, date!(2025 - 04 - 05), &connection),
            Ok(true)
        );
        assert_eq!(
            get_rule(id, &connection).unwrap().last_processed,
            Some(date!(2025 - 04 - 05))
        );
    }

    #[test]
    fn cannot_claim_inactive_rule() {
        let connection = get_test_connection();
        let id = insert("park77", 5, &connection);
        deactivate_rule(id, &connection).unwrap();

        assert_eq!(
            claim_rule_for_month(id, date!(2025 - 03 - 05), &connection),
            Ok(false)
        );
    }
}
