//! The API endpoints URIs.
//!
//! Endpoints that act on a single record take its ID as the `id` query parameter,
//! e.g. `DELETE /api/spending?id=3`.

/// The route for joining or creating a family.
pub const JOIN_FAMILY: &str = "/api/families/join";
/// The route to create, list and delete spending.
pub const SPENDING: &str = "/api/spending";
/// The route to create, list and delete income.
pub const INCOME: &str = "/api/income";
/// The route to create, list and delete recurring rules.
pub const RECURRING_RULES: &str = "/api/recurring-rules";
/// The route that posts every recurring rule due today.
pub const RECURRING_PROCESS: &str = "/api/recurring-process";
/// The route for a family's monthly summary.
pub const DASHBOARD: &str = "/api/dashboard";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::JOIN_FAMILY);
        assert_endpoint_is_valid_uri(endpoints::SPENDING);
        assert_endpoint_is_valid_uri(endpoints::INCOME);
        assert_endpoint_is_valid_uri(endpoints::RECURRING_RULES);
        assert_endpoint_is_valid_uri(endpoints::RECURRING_PROCESS);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD);
    }
}
