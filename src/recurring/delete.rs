use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    ApiResponse, Error,
    app_state::lock_connection,
    database_id::RuleId,
    recurring::{db::deactivate_rule, models::RecurringState},
};

/// The query string for deleting a recurring rule.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRuleParams {
    /// The ID of the rule to deactivate.
    pub id: Option<RuleId>,
}

/// A route handler for deleting a recurring rule by `?id=`.
///
/// The rule is deactivated rather than removed, so it is never posted again.
pub async fn delete_rule_endpoint(
    State(state): State<RecurringState>,
    params: Result<Query<DeleteRuleParams>, QueryRejection>,
) -> Response {
    match delete(&state, params) {
        Ok(()) => ApiResponse::ok().into_response(),
        Err(error) => error.into_response(),
    }
}

fn delete(
    state: &RecurringState,
    params: Result<Query<DeleteRuleParams>, QueryRejection>,
) -> Result<(), Error> {
    let Query(params) = params.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let id = params.id.ok_or(Error::MissingField("id"))?;

    let connection = lock_connection(&state.db_connection)?;
    deactivate_rule(id, &connection)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };

    use crate::{
        category::SpendingCategory,
        family::{FamilyCode, UserName},
        payment_method::PaymentMethod,
        recurring::{
            db::{create_rule, get_rule},
            models::{DayOfMonth, NewRecurringRule, RecurringState},
            schedule::ShortMonthPolicy,
        },
        test_utils::get_test_connection,
        transaction::Amount,
    };

    use super::{DeleteRuleParams, delete_rule_endpoint};

    fn get_test_state() -> (RecurringState, i64) {
        let connection = get_test_connection();
        let rule = create_rule(
            NewRecurringRule {
                amount: Amount::new_unchecked(9_900),
                category: SpendingCategory::CultureHobbies,
                memo: None,
                user_name: UserName::new_unchecked("준호"),
                family_code: FamilyCode::new_unchecked("park77"),
                day_of_month: DayOfMonth::new_unchecked(3),
                payment_method: PaymentMethod::Card,
            },
            &connection,
        )
        .unwrap();

        let state = RecurringState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Seoul".to_owned(),
            short_month_policy: ShortMonthPolicy::Skip,
        };

        (state, rule.id)
    }

    #[tokio::test]
    async fn deactivates_rule() {
        let (state, id) = get_test_state();

        let response = delete_rule_endpoint(
            State(state.clone()),
            Ok(Query(DeleteRuleParams { id: Some(id) })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert!(!get_rule(id, &connection).unwrap().is_active);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let (state, id) = get_test_state();
        delete_rule_endpoint(
            State(state.clone()),
            Ok(Query(DeleteRuleParams { id: Some(id) })),
        )
        .await;

        let response =
            delete_rule_endpoint(State(state), Ok(Query(DeleteRuleParams { id: Some(id) }))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn id_is_required() {
        let (state, _) = get_test_state();

        let response =
            delete_rule_endpoint(State(state), Ok(Query(DeleteRuleParams::default()))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
