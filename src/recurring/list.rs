use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    ApiResponse, Error,
    app_state::lock_connection,
    family::FamilyCode,
    recurring::{
        db::list_active_rules_for_family,
        models::{RecurringRule, RecurringState},
    },
};

/// The query string for listing recurring rules.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRulesParams {
    /// The family to list rules for.
    pub family_code: Option<String>,
}

/// A route handler for listing the active recurring rules of a family, newest first.
pub async fn list_rules_endpoint(
    State(state): State<RecurringState>,
    params: Result<Query<ListRulesParams>, QueryRejection>,
) -> Response {
    match list(&state, params) {
        Ok(rules) => ApiResponse::success(rules).into_response(),
        Err(error) => error.into_response(),
    }
}

fn list(
    state: &RecurringState,
    params: Result<Query<ListRulesParams>, QueryRejection>,
) -> Result<Vec<RecurringRule>, Error> {
    let Query(params) = params.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let family_code = params
        .family_code
        .ok_or(Error::MissingField("familyCode"))?;
    let family_code = FamilyCode::new(&family_code)?;

    let connection = lock_connection(&state.db_connection)?;
    list_active_rules_for_family(&family_code, &connection)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use serde_json::json;

    use crate::{
        category::SpendingCategory,
        family::{FamilyCode, UserName},
        payment_method::PaymentMethod,
        recurring::{
            db::{create_rule, deactivate_rule},
            models::{DayOfMonth, NewRecurringRule, RecurringState},
            schedule::ShortMonthPolicy,
        },
        test_utils::{get_test_connection, response_json},
        transaction::Amount,
    };

    use super::{ListRulesParams, list_rules_endpoint};

    fn get_test_state() -> RecurringState {
        let connection = get_test_connection();
        for (family_code, amount) in [("park77", 10_000), ("park77", 20_000), ("lee88", 30_000)] {
            create_rule(
                NewRecurringRule {
                    amount: Amount::new_unchecked(amount),
                    category: SpendingCategory::HousingInternet,
                    memo: None,
                    user_name: UserName::new_unchecked("민지"),
                    family_code: FamilyCode::new_unchecked(family_code),
                    day_of_month: DayOfMonth::new_unchecked(10),
                    payment_method: PaymentMethod::Card,
                },
                &connection,
            )
            .unwrap();
        }
        deactivate_rule(1, &connection).unwrap();

        RecurringState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Seoul".to_owned(),
            short_month_policy: ShortMonthPolicy::Skip,
        }
    }

    #[tokio::test]
    async fn lists_active_rules_of_family() {
        let params = ListRulesParams {
            family_code: Some("park77".to_owned()),
        };

        let response = list_rules_endpoint(State(get_test_state()), Ok(Query(params))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let amounts: Vec<_> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|rule| rule["amount"].clone())
            .collect();
        assert_eq!(amounts, vec![json!(20_000)]);
    }

    #[tokio::test]
    async fn family_code_is_required() {
        let response = list_rules_endpoint(
            State(get_test_state()),
            Ok(Query(ListRulesParams::default())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
