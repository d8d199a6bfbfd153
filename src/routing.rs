//! Application router configuration.

use axum::{
    Router,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    ApiResponse, AppState,
    dashboard::get_dashboard_endpoint,
    endpoints,
    family::join_family_endpoint,
    recurring::{
        create_rule_endpoint, delete_rule_endpoint, list_rules_endpoint,
        process_recurring_endpoint,
    },
    transaction::{
        create_income_endpoint, create_spending_endpoint, delete_income_endpoint,
        delete_spending_endpoint, list_income_endpoint, list_spending_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::JOIN_FAMILY, post(join_family_endpoint))
        .route(
            endpoints::SPENDING,
            get(list_spending_endpoint)
                .post(create_spending_endpoint)
                .delete(delete_spending_endpoint),
        )
        .route(
            endpoints::INCOME,
            get(list_income_endpoint)
                .post(create_income_endpoint)
                .delete(delete_income_endpoint),
        )
        .route(
            endpoints::RECURRING_RULES,
            get(list_rules_endpoint)
                .post(create_rule_endpoint)
                .delete(delete_rule_endpoint),
        )
        .route(
            endpoints::RECURRING_PROCESS,
            post(process_recurring_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        ApiResponse::<()>::failure(format!("no route for {uri}")),
    )
        .into_response()
}
