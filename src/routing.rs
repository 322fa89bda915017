//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};

use crate::{
    AppState,
    auth::{
        AccountState, auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page,
        post_log_in, register_user,
    },
    dashboard::{get_dashboard_events, get_dashboard_page, get_dashboard_transactions},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    logging::logging_middleware,
    not_found::get_404_not_found,
    transaction::{
        clear_transactions_endpoint, create_transaction_endpoint, delete_transaction_endpoint,
        edit_transaction_endpoint, export_transactions, get_edit_transaction_page,
        import_transactions,
    },
};

/// Return a router with all the app's routes.
///
/// With the live collection every page and API route requires a signed-in
/// user and the log-in, registration and log-out routes are added. The local
/// snapshot has no users, so nothing is guarded.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let page_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::EXPORT, get(export_transactions));

    // These routes are called by htmx, so they need the HX-Redirect header for auth redirects.
    let api_routes = Router::new()
        .route(
            endpoints::DASHBOARD_TRANSACTIONS,
            get(get_dashboard_transactions),
        )
        .route(endpoints::DASHBOARD_EVENTS, get(get_dashboard_events))
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint).delete(clear_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::IMPORT, post(import_transactions));

    let router = match AccountState::from_app_state(&state) {
        Some(account_state) => {
            let account_routes = Router::new()
                .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
                .route(endpoints::LOG_IN_API, post(post_log_in))
                .route(endpoints::LOG_OUT, get(get_log_out))
                .route(endpoints::REGISTER_VIEW, get(get_register_page))
                .route(endpoints::USERS, post(register_user))
                .with_state(account_state);

            page_routes
                .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
                .merge(
                    api_routes
                        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
                )
                .merge(account_routes)
        }
        None => page_routes.merge(api_routes),
    };

    router
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}
