//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with the summary, entry form, list and charts.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The filtered transaction list and category chart, rendered as a fragment.
pub const DASHBOARD_TRANSACTIONS: &str = "/dashboard/transactions";
/// Server-sent events telling an open dashboard that the transactions changed.
pub const DASHBOARD_EVENTS: &str = "/dashboard/events";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create transactions and to clear all of them.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to download every transaction as a JSON file.
pub const EXPORT: &str = "/api/export";
/// The route to upload a JSON file of transactions.
pub const IMPORT: &str = "/api/import";

/// Replace the `{...}` parameter in `endpoint_path` with `id`, e.g.
/// `/api/transactions/{transaction_id}` becomes `/api/transactions/42`.
///
/// Paths without a complete parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let parts = endpoint_path
        .split_once('{')
        .and_then(|(head, rest)| rest.split_once('}').map(|(_, tail)| (head, tail)));

    match parts {
        Some((head, tail)) => format!("{head}{id}{tail}"),
        None => endpoint_path.to_owned(),
    }
}

#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_EVENTS);
        assert_endpoint_is_valid_uri(endpoints::EDIT_TRANSACTION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);

        assert_endpoint_is_valid_uri(endpoints::LOG_IN_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_API);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::EXPORT);
        assert_endpoint_is_valid_uri(endpoints::IMPORT);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
        assert_eq!(format_endpoint("/hello/{world", 1), "/hello/{world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, 1700000000123);

        assert_eq!(formatted_path, "/transactions/1700000000123/edit");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
