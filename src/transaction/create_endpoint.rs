//! Defines the endpoints for recording new spending and income.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    ApiResponse, AppState, Error,
    app_state::lock_connection,
    category::Category,
    family::{FamilyCode, UserName, find_or_create_family},
    payment_method::PaymentMethod,
    timezone::local_today,
    transaction::{
        Transaction, TransactionKind,
        core::{Amount, Memo, create_transaction},
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// The value of the transaction in won.
    pub amount: Option<i64>,
    /// The category label, e.g. "식비 - 외식".
    pub category: Option<String>,
    /// An optional note.
    pub memo: Option<String>,
    /// The member recording the transaction.
    pub user_name: Option<String>,
    /// The family the transaction belongs to.
    pub family_code: Option<String>,
    /// When the transaction happened, defaults to today.
    pub date: Option<Date>,
    /// One of "card", "cash" or "transfer", defaults to "card".
    pub payment_method: Option<String>,
}

/// A route handler for recording spending.
pub async fn create_spending_endpoint(
    State(state): State<CreateTransactionState>,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Response {
    respond(create(TransactionKind::Spending, &state, body))
}

/// A route handler for recording income.
pub async fn create_income_endpoint(
    State(state): State<CreateTransactionState>,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Response {
    respond(create(TransactionKind::Income, &state, body))
}

fn respond(result: Result<Transaction, Error>) -> Response {
    match result {
        Ok(transaction) => {
            (StatusCode::CREATED, ApiResponse::success(transaction)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

fn create(
    kind: TransactionKind,
    state: &CreateTransactionState,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Transaction, Error> {
    let Json(request) = body.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;

    let amount = request.amount.ok_or(Error::MissingField("amount"))?;
    let category = request.category.ok_or(Error::MissingField("category"))?;
    let user_name = request.user_name.ok_or(Error::MissingField("userName"))?;
    let family_code = request
        .family_code
        .ok_or(Error::MissingField("familyCode"))?;

    let amount = Amount::new(amount)?;
    let category = Category::parse(kind, &category)?;
    let memo = Memo::parse_optional(request.memo.as_deref())?;
    let user_name = UserName::new(&user_name)?;
    let family_code = FamilyCode::new(&family_code)?;
    let payment_method = match request.payment_method.as_deref() {
        Some(payment_method) => payment_method.parse()?,
        None => PaymentMethod::default(),
    };

    let today = local_today(&state.local_timezone)?;
    let date = request.date.unwrap_or(today);
    if date > today {
        return Err(Error::FutureDate(date));
    }

    let builder = Transaction::build(amount, category, family_code, user_name, date)
        .memo(memo)
        .payment_method(payment_method);

    let connection = lock_connection(&state.db_connection)?;
    find_or_create_family(&builder.family_code, &builder.user_name, &connection)?;
    let transaction = create_transaction(builder, &connection)?;

    tracing::info!(
        "{} recorded {kind} of {} in {}",
        transaction.user_name,
        transaction.amount,
        transaction.category
    );

    Ok(transaction)
}
