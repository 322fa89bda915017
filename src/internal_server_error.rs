//! The page to display for an internal server error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// What went wrong and what the user can do about it.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

/// Render the 500 page for `error`.
pub fn render_internal_server_error(error: InternalServerError<'_>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_view("Internal Server Error", "500", error.description, error.fix),
    )
        .into_response()
}

/// Display the generic 500 page.
pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(InternalServerError::default())
}

/// Send an htmx request to the 500 page.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}
