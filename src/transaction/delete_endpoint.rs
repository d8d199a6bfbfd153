use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    ApiResponse, AppState, Error,
    app_state::lock_connection,
    database_id::TransactionId,
    transaction::{TransactionKind, delete_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for deleting a transaction.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteTransactionParams {
    /// The ID of the transaction to delete.
    pub id: Option<TransactionId>,
}

/// A route handler for deleting spending by `?id=`.
pub async fn delete_spending_endpoint(
    State(state): State<DeleteTransactionState>,
    params: Result<Query<DeleteTransactionParams>, QueryRejection>,
) -> Response {
    respond(delete(TransactionKind::Spending, &state, params))
}

/// A route handler for deleting income by `?id=`.
pub async fn delete_income_endpoint(
    State(state): State<DeleteTransactionState>,
    params: Result<Query<DeleteTransactionParams>, QueryRejection>,
) -> Response {
    respond(delete(TransactionKind::Income, &state, params))
}

fn respond(result: Result<(), Error>) -> Response {
    match result {
        Ok(()) => ApiResponse::ok().into_response(),
        Err(error) => error.into_response(),
    }
}

fn delete(
    kind: TransactionKind,
    state: &DeleteTransactionState,
    params: Result<Query<DeleteTransactionParams>, QueryRejection>,
) -> Result<(), Error> {
    let Query(params) = params.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let id = params.id.ok_or(Error::MissingField("id"))?;

    let connection = lock_connection(&state.db_connection)?;
    delete_transaction(kind, id, &connection)
}
