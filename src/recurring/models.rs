use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{
    Connection, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::Serialize;
use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    category::{Category, SpendingCategory},
    database_id::RuleId,
    family::{FamilyCode, UserName},
    payment_method::PaymentMethod,
    recurring::schedule::ShortMonthPolicy,
    transaction::{Amount, MEMO_MAX_LENGTH, Memo, Transaction, TransactionBuilder},
};

/// Marks the memo of transactions posted from a recurring rule.
pub const RECURRING_MEMO_PREFIX: &str = "[정기]";

/// The day of the month a recurring rule becomes due, from 1 to 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    /// Create a day of the month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDayOfMonth] if `day` is not between 1 and 31.
    pub fn new(day: i64) -> Result<Self, Error> {
        match u8::try_from(day) {
            Ok(day @ 1..=31) => Ok(Self(day)),
            _ => Err(Error::InvalidDayOfMonth(day)),
        }
    }

    /// Create a day of the month without validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant
    /// is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(day: u8) -> Self {
        Self(day)
    }

    /// The day as a number.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Display for DayOfMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for DayOfMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for DayOfMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        u8::column_result(value).map(DayOfMonth::new_unchecked)
    }
}

/// A template for spending that is posted once per calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    /// The ID of the rule.
    pub id: RuleId,
    /// The amount of each posted transaction.
    pub amount: Amount,
    /// The spending category of each posted transaction.
    pub category: SpendingCategory,
    /// The note copied onto each posted transaction after the recurring prefix.
    pub memo: Option<Memo>,
    /// The member the posted transactions are recorded for.
    pub user_name: UserName,
    /// The family the rule belongs to.
    pub family_code: FamilyCode,
    /// The day of the month the rule becomes due.
    pub day_of_month: DayOfMonth,
    /// Inactive rules are never posted again.
    pub is_active: bool,
    /// When the rule was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The date of the most recent posting, if any.
    pub last_processed: Option<Date>,
    /// How each posted transaction is paid for.
    pub payment_method: PaymentMethod,
}

impl RecurringRule {
    /// The memo for transactions posted from this rule, e.g. "[정기] 넷플릭스".
    ///
    /// The rule's memo is cut short if the prefix would push it past [MEMO_MAX_LENGTH]
    /// characters.
    pub fn posted_memo(&self) -> Memo {
        let memo = self.memo.as_ref().map(Memo::as_ref).unwrap_or_default();
        let room = MEMO_MAX_LENGTH - RECURRING_MEMO_PREFIX.graphemes(true).count() - 1;
        let memo: String = memo.graphemes(true).take(room).collect();
        let text = format!("{RECURRING_MEMO_PREFIX} {memo}");

        Memo::new_unchecked(text.trim())
    }

    /// The transaction to post for this rule on `date`.
    pub fn transaction_builder(&self, date: Date) -> TransactionBuilder {
        Transaction::build(
            self.amount,
            Category::Spending(self.category),
            self.family_code.clone(),
            self.user_name.clone(),
            date,
        )
        .memo(Some(self.posted_memo()))
        .payment_method(self.payment_method)
        .recurring_id(Some(self.id))
    }
}

/// The fields needed to create a [RecurringRule].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringRule {
    /// The amount of each posted transaction.
    pub amount: Amount,
    /// The spending category of each posted transaction.
    pub category: SpendingCategory,
    /// An optional note.
    pub memo: Option<Memo>,
    /// The member the posted transactions are recorded for.
    pub user_name: UserName,
    /// The family the rule belongs to.
    pub family_code: FamilyCode,
    /// The day of the month the rule becomes due.
    pub day_of_month: DayOfMonth,
    /// How each posted transaction is paid for.
    pub payment_method: PaymentMethod,
}

/// Unified state for all recurring rule operations.
#[derive(Debug, Clone)]
pub struct RecurringState {
    /// The database connection for managing rules and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
    /// How rules due on a day some months lack are handled.
    pub short_month_policy: ShortMonthPolicy,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            short_month_policy: state.short_month_policy,
        }
    }
}
