//! Defines the endpoints for listing spending and income.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    ApiResponse, AppState, Error,
    app_state::lock_connection,
    family::FamilyCode,
    transaction::{
        Transaction, TransactionKind,
        core::{TransactionQuery, query_transactions},
    },
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for listing transactions.
///
/// Either `familyCode` or the comma separated `familyCodes` must be given.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsParams {
    /// A single family to list transactions for.
    pub family_code: Option<String>,
    /// Several families to list transactions for, e.g. "kim2024,lee2024".
    pub family_codes: Option<String>,
    /// The earliest date to include.
    pub from: Option<Date>,
    /// The latest date to include.
    pub to: Option<Date>,
}

impl ListTransactionsParams {
    fn into_query(self) -> Result<TransactionQuery, Error> {
        let codes = match (self.family_codes, self.family_code) {
            (Some(codes), _) => codes,
            (None, Some(code)) => code,
            (None, None) => return Err(Error::MissingField("familyCode")),
        };

        let family_codes = codes
            .split(',')
            .filter(|code| !code.trim().is_empty())
            .map(FamilyCode::new)
            .collect::<Result<Vec<_>, _>>()?;

        if family_codes.is_empty() {
            return Err(Error::MissingField("familyCode"));
        }

        Ok(TransactionQuery {
            family_codes,
            from: self.from,
            to: self.to,
        })
    }
}

/// A route handler for listing spending, newest first.
pub async fn list_spending_endpoint(
    State(state): State<ListTransactionsState>,
    params: Result<Query<ListTransactionsParams>, QueryRejection>,
) -> Response {
    respond(list(TransactionKind::Spending, &state, params))
}

/// A route handler for listing income, newest first.
pub async fn list_income_endpoint(
    State(state): State<ListTransactionsState>,
    params: Result<Query<ListTransactionsParams>, QueryRejection>,
) -> Response {
    respond(list(TransactionKind::Income, &state, params))
}

fn respond(result: Result<Vec<Transaction>, Error>) -> Response {
    match result {
        Ok(transactions) => ApiResponse::success(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

fn list(
    kind: TransactionKind,
    state: &ListTransactionsState,
    params: Result<Query<ListTransactionsParams>, QueryRejection>,
) -> Result<Vec<Transaction>, Error> {
    let Query(params) = params.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let query = params.into_query()?;

    let connection = lock_connection(&state.db_connection)?;
    query_transactions(kind, &query, &connection)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Date, macros::date};

    use crate::{
        category::{Category, SpendingCategory},
        family::{FamilyCode, UserName, find_or_create_family},
        test_utils::{get_test_connection, response_json},
        transaction::{Amount, Transaction, create_transaction},
    };

    use super::{
        ListTransactionsParams, ListTransactionsState, list_income_endpoint,
        list_spending_endpoint,
    };

    fn insert_spending(code: &str, amount: i64, date: Date, connection: &Connection) {
        let code = FamilyCode::new_unchecked(code);
        let user = UserName::new_unchecked("민지");
        find_or_create_family(&code, &user, connection).unwrap();
        create_transaction(
            Transaction::build(
                Amount::new_unchecked(amount),
                Category::Spending(SpendingCategory::CafeCoffee),
                code,
                user,
                date,
            ),
            connection,
        )
        .unwrap();
    }

    fn get_test_state() -> ListTransactionsState {
        let connection = get_test_connection();
        insert_spending("park77", 4_500, date!(2025 - 05 - 01), &connection);
        insert_spending("park77", 5_000, date!(2025 - 05 - 20), &connection);
        insert_spending("lee88", 6_000, date!(2025 - 05 - 10), &connection);
        insert_spending("choi99", 7_000, date!(2025 - 05 - 10), &connection);

        ListTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn lists_single_family() {
        let params = ListTransactionsParams {
            family_code: Some("park77".to_owned()),
            ..Default::default()
        };

        let response = list_spending_endpoint(State(get_test_state()), Ok(Query(params))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let amounts: Vec<_> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["amount"].clone())
            .collect();
        assert_eq!(amounts, vec![json!(5_000), json!(4_500)]);
    }

    #[tokio::test]
    async fn lists_several_families_in_range() {
        let params = ListTransactionsParams {
            family_codes: Some("park77,lee88".to_owned()),
            from: Some(date!(2025 - 05 - 05)),
            to: Some(date!(2025 - 05 - 31)),
            ..Default::default()
        };

        let response = list_spending_endpoint(State(get_test_state()), Ok(Query(params))).await;

        let body = response_json(response).await;
        let codes: Vec<_> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["familyCode"].clone())
            .collect();
        assert_eq!(codes, vec![json!("park77"), json!("lee88")]);
    }

    #[tokio::test]
    async fn income_is_listed_separately() {
        let params = ListTransactionsParams {
            family_code: Some("park77".to_owned()),
            ..Default::default()
        };

        let response = list_income_endpoint(State(get_test_state()), Ok(Query(params))).await;

        let body = response_json(response).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn family_code_is_required() {
        let response = list_spending_endpoint(
            State(get_test_state()),
            Ok(Query(ListTransactionsParams::default())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_family_code_is_rejected() {
        let params = ListTransactionsParams {
            family_codes: Some("park77,no!".to_owned()),
            ..Default::default()
        };

        let response = list_spending_endpoint(State(get_test_state()), Ok(Query(params))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
