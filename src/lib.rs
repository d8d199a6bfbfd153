//! Family Ledger is a shared household expense and income tracker.
//!
//! Members of a family join with a shared family code, record spending and
//! income, and set up recurring spending rules that are posted as concrete
//! transactions once per calendar month.
//!
//! This library provides a JSON API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod api_response;
mod app_state;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod family;
mod logging;
mod payment_method;
mod recurring;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use api_response::ApiResponse;
pub use app_state::AppState;
pub use category::{Category, IncomeCategory, IncomeGroup, SpendingCategory, SpendingGroup};
pub use dashboard::{LabelTotal, MonthlySummary, YearMonth, summarize_month};
pub use db::initialize as initialize_db;
pub use family::{
    Family, FamilyCode, MAX_FAMILY_MEMBERS, UserName, find_family, find_or_create_family,
    join_family,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_BYTES, logging_middleware};
pub use payment_method::PaymentMethod;
pub use recurring::{
    DayOfMonth, MaterializationResult, NewRecurringRule, RECURRING_MEMO_PREFIX, RecurringRule,
    RecurringStore, ShortMonthPolicy, SqliteRecurringStore, claim_rule_for_month, create_rule,
    deactivate_rule, get_rule, is_due, list_active_rules, list_active_rules_for_family,
    process_due, spawn_recurring_scheduler,
};
pub use routing::build_router;
pub use timezone::local_today;
pub use transaction::{
    Amount, MAX_AMOUNT, MEMO_MAX_LENGTH, Memo, Transaction, TransactionBuilder, TransactionKind,
    TransactionQuery, create_transaction, delete_transaction, get_transaction, query_transactions,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing from the request.
    #[error("the field \"{0}\" is required")]
    MissingField(&'static str),

    /// The request body or query string could not be parsed.
    ///
    /// Callers should pass in the rejection text from the extractor.
    #[error("could not parse the request: {0}")]
    InvalidRequest(String),

    /// A family code must be 3 to 20 ASCII letters or digits.
    #[error("\"{0}\" is not a valid family code, use 3 to 20 letters or digits")]
    InvalidFamilyCode(String),

    /// A user name must be 1 to 20 Hangul, ASCII letters, digits or spaces.
    #[error("\"{0}\" is not a valid user name")]
    InvalidUserName(String),

    /// Amounts are whole numbers between 1 and 100,000,000.
    #[error("{0} is not a valid amount, use a whole number between 1 and 100,000,000")]
    InvalidAmount(i64),

    /// The category is not part of the catalog for the kind of transaction.
    #[error("\"{0}\" is not a known category")]
    InvalidCategory(String),

    /// The payment method is not one of card, cash or transfer.
    #[error("\"{0}\" is not a valid payment method")]
    InvalidPaymentMethod(String),

    /// The memo is longer than the allowed number of characters.
    #[error("the memo is longer than {0} characters")]
    MemoTooLong(usize),

    /// The day of the month for a recurring rule must be between 1 and 31.
    #[error("{0} is not a valid day of the month, use a number between 1 and 31")]
    InvalidDayOfMonth(i64),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A month query parameter was not in the format `YYYY-MM`.
    #[error("\"{0}\" is not a valid month, use the format YYYY-MM")]
    InvalidMonth(String),

    /// A new user tried to join a family that has no free places.
    #[error("the family \"{0}\" already has the maximum number of members")]
    FamilyFull(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a recurring rule that does not exist or is already inactive.
    #[error("tried to delete a recurring rule that is not in the database")]
    DeleteMissingRule,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code for the error.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField(_)
            | Error::InvalidRequest(_)
            | Error::InvalidFamilyCode(_)
            | Error::InvalidUserName(_)
            | Error::InvalidAmount(_)
            | Error::InvalidCategory(_)
            | Error::InvalidPaymentMethod(_)
            | Error::MemoTooLong(_)
            | Error::InvalidDayOfMonth(_)
            | Error::FutureDate(_)
            | Error::InvalidMonth(_) => StatusCode::BAD_REQUEST,
            Error::FamilyFull(_) => StatusCode::CONFLICT,
            Error::NotFound | Error::DeleteMissingTransaction | Error::DeleteMissingRule => {
                StatusCode::NOT_FOUND
            }
            Error::SqlError(_) | Error::DatabaseLockError | Error::InvalidTimezoneError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code.is_server_error() {
            // Internal errors are logged, not shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, ApiResponse::<()>::failure(message)).into_response()
    }
}
