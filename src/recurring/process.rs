use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    ApiResponse, Error,
    app_state::lock_connection,
    recurring::{
        materializer::{MaterializationResult, process_due},
        models::RecurringState,
        store::SqliteRecurringStore,
    },
    timezone::local_today,
};

/// A route handler that posts every recurring rule due today.
///
/// Safe to call any number of times, each rule is posted at most once per month.
pub async fn process_recurring_endpoint(State(state): State<RecurringState>) -> Response {
    match run_materializer(&state) {
        Ok(result) => ApiResponse::success(result).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Post the rules due on today's local date.
///
/// # Errors
/// Returns an error if the timezone is invalid, the database lock cannot be acquired or
/// the active rules cannot be listed.
pub(crate) fn run_materializer(state: &RecurringState) -> Result<MaterializationResult, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    process_due(
        &SqliteRecurringStore::new(&connection),
        today,
        state.short_month_policy,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use serde_json::json;

    use crate::{
        category::SpendingCategory,
        family::{FamilyCode, UserName},
        payment_method::PaymentMethod,
        recurring::{
            db::create_rule,
            models::{DayOfMonth, NewRecurringRule, RecurringState},
            schedule::ShortMonthPolicy,
        },
        test_utils::{get_test_connection, response_json},
        transaction::Amount,
    };

    use super::process_recurring_endpoint;

    fn get_test_state(local_timezone: &str) -> RecurringState {
        let connection = get_test_connection();
        // Day 1 is due on every day of every month.
        create_rule(
            NewRecurringRule {
                amount: Amount::new_unchecked(50_000),
                category: SpendingCategory::FoodDiningOut,
                memo: None,
                user_name: UserName::new_unchecked("민지"),
                family_code: FamilyCode::new_unchecked("park77"),
                day_of_month: DayOfMonth::new_unchecked(1),
                payment_method: PaymentMethod::Card,
            },
            &connection,
        )
        .unwrap();

        RecurringState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: local_timezone.to_owned(),
            short_month_policy: ShortMonthPolicy::Skip,
        }
    }

    #[tokio::test]
    async fn posts_due_rules_once() {
        let state = get_test_state("Asia/Seoul");

        let first = process_recurring_endpoint(State(state.clone())).await;
        let second = process_recurring_endpoint(State(state)).await;

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            response_json(first).await,
            json!({"success": true, "data": {"processed": 1, "failed": 0}})
        );
        assert_eq!(
            response_json(second).await,
            json!({"success": true, "data": {"processed": 0, "failed": 0}})
        );
    }

    #[tokio::test]
    async fn invalid_timezone_is_server_error() {
        let state = get_test_state("Not/AZone");

        let response = process_recurring_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_json(response).await;
        assert_eq!(body["success"], json!(false));
    }
}
