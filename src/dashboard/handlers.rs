//! The monthly dashboard endpoint.

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
    dashboard::{MonthlySummary, YearMonth, summarize_month},
    family::FamilyCode,
    timezone::local_today,
    transaction::{TransactionKind, TransactionQuery, query_transactions},
};

/// The state needed for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string for the dashboard.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    /// The family to summarise.
    pub family_code: Option<String>,
    /// The month to summarise as `YYYY-MM`, defaults to the current month.
    pub month: Option<String>,
}

/// A route handler for a family's monthly summary.
pub async fn get_dashboard_endpoint(
    State(state): State<DashboardState>,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Response {
    match dashboard(&state, params) {
        Ok(summary) => ApiResponse::success(summary).into_response(),
        Err(error) => error.into_response(),
    }
}

fn dashboard(
    state: &DashboardState,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<MonthlySummary, Error> {
    let Query(params) = params.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let family_code = params
        .family_code
        .ok_or(Error::MissingField("familyCode"))?;
    let family_code = FamilyCode::new(&family_code)?;
    let month = match params.month {
        Some(month) => month.parse()?,
        None => YearMonth::of(local_today(&state.local_timezone)?),
    };

    let query = TransactionQuery {
        family_codes: vec![family_code],
        from: Some(month.first_day()),
        to: Some(month.last_day()),
    };

    let connection = lock_connection(&state.db_connection)?;
    let spending = query_transactions(TransactionKind::Spending, &query, &connection)?;
    let income = query_transactions(TransactionKind::Income, &query, &connection)?;

    Ok(summarize_month(month, &spending, &income))
}
