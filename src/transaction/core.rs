//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error,
    category::Category,
    database_id::{RuleId, TransactionId},
    family::{FamilyCode, UserName},
    payment_method::PaymentMethod,
};

// ============================================================================
// MODELS
// ============================================================================

/// The largest amount a single transaction can hold.
pub const MAX_AMOUNT: i64 = 100_000_000;

/// The maximum number of characters in a memo.
pub const MEMO_MAX_LENGTH: usize = 200;

/// Whether money was spent or earned.
///
/// Spending and income have the same shape but are kept in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money that was spent.
    Spending,
    /// Money that was earned.
    Income,
}

impl TransactionKind {
    /// The name of the table holding transactions of this kind.
    pub fn table_name(self) -> &'static str {
        match self {
            TransactionKind::Spending => "spending",
            TransactionKind::Income => "income",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A whole, positive amount of money no larger than [MAX_AMOUNT].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `value` is zero, negative or larger than [MAX_AMOUNT].
    pub fn new(value: i64) -> Result<Self, Error> {
        if (1..=MAX_AMOUNT).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidAmount(value))
        }
    }

    /// Create an amount without validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant
    /// is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(value: i64) -> Self {
        Self(value)
    }

    /// The amount as an integer.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount::new_unchecked)
    }
}

/// A free text note attached to a transaction, at most [MEMO_MAX_LENGTH] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Memo(String);

impl Memo {
    /// Create a memo from `text` after trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns [Error::MemoTooLong] if `text` has more than [MEMO_MAX_LENGTH] characters.
    pub fn new(text: &str) -> Result<Self, Error> {
        let text = text.trim();

        if text.graphemes(true).count() > MEMO_MAX_LENGTH {
            Err(Error::MemoTooLong(MEMO_MAX_LENGTH))
        } else {
            Ok(Self(text.to_owned()))
        }
    }

    /// Parse an optional memo, treating blank text as no memo.
    ///
    /// # Errors
    /// Returns [Error::MemoTooLong] if `text` has more than [MEMO_MAX_LENGTH] characters.
    pub fn parse_optional(text: Option<&str>) -> Result<Option<Self>, Error> {
        match text.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => Memo::new(text).map(Some),
        }
    }

    /// Create a memo without validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant
    /// is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl AsRef<str> for Memo {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Memo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction, unique within its kind.
    pub id: TransactionId,
    /// Whether this is spending or income.
    pub kind: TransactionKind,
    /// The amount of money spent or earned in this transaction.
    pub amount: Amount,
    /// The catalog category of the transaction.
    pub category: Category,
    /// A text description of what the transaction was for.
    pub memo: Option<Memo>,
    /// The family member that recorded the transaction.
    pub user_name: UserName,
    /// The family the transaction belongs to.
    pub family_code: FamilyCode,
    /// The day the transaction is attributed to.
    pub date: Date,
    /// When the transaction was written to the database.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// How the transaction was paid for.
    pub payment_method: PaymentMethod,
    /// Whether the transaction was posted from a recurring rule.
    pub is_recurring: bool,
    /// The recurring rule the transaction was posted from.
    pub recurring_id: Option<RuleId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    /// The kind of the transaction follows from `category`.
    pub fn build(
        amount: Amount,
        category: Category,
        family_code: FamilyCode,
        user_name: UserName,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            category,
            family_code,
            user_name,
            date,
            memo: None,
            payment_method: PaymentMethod::default(),
            recurring_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Optional fields start out empty, the payment method starts out as
/// [PaymentMethod::Card]. Pass the finished builder to [create_transaction].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// The catalog category, which also decides the kind of the transaction.
    pub category: Category,
    /// The family the transaction belongs to.
    pub family_code: FamilyCode,
    /// The member recording the transaction.
    pub user_name: UserName,
    /// The day the transaction is attributed to.
    ///
    /// Callers taking dates from users must check that it is not in the future.
    pub date: Date,
    /// An optional note.
    pub memo: Option<Memo>,
    /// How the transaction was paid for.
    pub payment_method: PaymentMethod,
    /// The recurring rule that produced the transaction, if any.
    pub recurring_id: Option<RuleId>,
}

impl TransactionBuilder {
    /// Set the memo for the transaction.
    pub fn memo(mut self, memo: Option<Memo>) -> Self {
        self.memo = memo;
        self
    }

    /// Set the payment method for the transaction.
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Mark the transaction as posted from the recurring rule `recurring_id`.
    pub fn recurring_id(mut self, recurring_id: Option<RuleId>) -> Self {
        self.recurring_id = recurring_id;
        self
    }

    /// The kind of the transaction being built.
    pub fn kind(&self) -> TransactionKind {
        self.category.kind()
    }
}

/// Which transactions to return from [query_transactions].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Only include transactions of these families. An empty list matches nothing.
    pub family_codes: Vec<FamilyCode>,
    /// Only include transactions on or after this date.
    pub from: Option<Date>,
    /// Only include transactions on or before this date.
    pub to: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, amount, category, memo, user_name, family_code, date, \
     created_at, payment_method, is_recurring, recurring_id";

/// Create a new transaction in the database from a builder.
///
/// The family referenced by the builder must already exist.
///
/// # Errors
/// This function will return an [Error::SqlError] if the family does not exist or there is
/// some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let kind = builder.kind();
    let created_at = OffsetDateTime::now_utc();

    let query = format!(
        "INSERT INTO {} (amount, category, memo, user_name, family_code, date, created_at, \
         payment_method, is_recurring, recurring_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING {TRANSACTION_COLUMNS}",
        kind.table_name()
    );

    let transaction = connection.prepare(&query)?.query_row(
        (
            builder.amount,
            builder.category,
            builder.memo.as_ref().map(Memo::as_ref),
            builder.user_name.as_ref(),
            builder.family_code.as_ref(),
            builder.date,
            created_at,
            builder.payment_method,
            builder.recurring_id.is_some(),
            builder.recurring_id,
        ),
        |row| map_transaction_row(kind, row),
    )?;

    Ok(transaction)
}

/// Retrieve a transaction of `kind` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    kind: TransactionKind,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM {} WHERE id = :id",
        kind.table_name()
    );

    let transaction = connection
        .prepare(&query)?
        .query_one(&[(":id", &id)], |row| map_transaction_row(kind, row))?;

    Ok(transaction)
}

/// Get the transactions of `kind` matching `query`, newest first.
///
/// Transactions on the same date are ordered by when they were created, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn query_transactions(
    kind: TransactionKind,
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    if query.family_codes.is_empty() {
        return Ok(Vec::new());
    }

    let mut params: Vec<String> = query
        .family_codes
        .iter()
        .map(|code| code.as_ref().to_owned())
        .collect();
    let placeholders = vec!["?"; params.len()].join(", ");
    let mut where_clause = format!("family_code IN ({placeholders})");

    if let Some(from) = query.from {
        where_clause.push_str(" AND date >= ?");
        params.push(from.to_string());
    }

    if let Some(to) = query.to {
        where_clause.push_str(" AND date <= ?");
        params.push(to.to_string());
    }

    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM {} WHERE {where_clause} \
         ORDER BY date DESC, created_at DESC, id DESC",
        kind.table_name()
    );

    connection
        .prepare(&sql)?
        .query_map(rusqlite::params_from_iter(params), |row| {
            map_transaction_row(kind, row)
        })?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Delete the transaction of `kind` with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if there is no transaction with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    kind: TransactionKind,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let query = format!("DELETE FROM {} WHERE id = :id", kind.table_name());
    let rows_affected = connection.execute(&query, &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    tracing::info!("Deleted {kind} transaction {id}");

    Ok(())
}

/// Create the spending and income tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [TransactionKind::Spending, TransactionKind::Income] {
        let table = kind.table_name();

        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    amount INTEGER NOT NULL CHECK (amount > 0),
                    category TEXT NOT NULL,
                    memo TEXT,
                    user_name TEXT NOT NULL,
                    family_code TEXT NOT NULL,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    payment_method TEXT NOT NULL DEFAULT 'card',
                    is_recurring INTEGER NOT NULL DEFAULT 0,
                    recurring_id INTEGER,
                    FOREIGN KEY(family_code) REFERENCES family(code) ON UPDATE CASCADE ON DELETE CASCADE,
                    FOREIGN KEY(recurring_id) REFERENCES recurring_rule(id) ON DELETE SET NULL
                )"
            ),
            (),
        )?;

        // Listing and the dashboard filter by family and date.
        connection.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_family_date ON {table}(family_code, date)"
            ),
            (),
        )?;
    }

    Ok(())
}

/// Map a database row to a Transaction of `kind`.
///
/// The row must have the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(kind: TransactionKind, row: &Row) -> Result<Transaction, rusqlite::Error> {
    let category = match kind {
        TransactionKind::Spending => Category::Spending(row.get(2)?),
        TransactionKind::Income => Category::Income(row.get(2)?),
    };
    let memo: Option<String> = row.get(3)?;
    let user_name: String = row.get(4)?;
    let family_code: String = row.get(5)?;

    Ok(Transaction {
        id: row.get(0)?,
        kind,
        amount: row.get(1)?,
        category,
        memo: memo.map(|memo| Memo::new_unchecked(&memo)),
        user_name: UserName::new_unchecked(&user_name),
        family_code: FamilyCode::new_unchecked(&family_code),
        date: row.get(6)?,
        created_at: row.get(7)?,
        payment_method: row.get(8)?,
        is_recurring: row.get(9)?,
        recurring_id: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
