//! Alert system for displaying success and error messages to users.
//!
//! Alerts are HTML fragments swapped into the `#alert-container` element of
//! the base page. They can be dismissed by hand and remove themselves after
//! [ALERT_TIMEOUT_MS] milliseconds.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// How long an alert stays on screen before it removes itself.
pub const ALERT_TIMEOUT_MS: u32 = 3000;

/// A notification shown to the user after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An action succeeded, with a line of extra detail.
    Success { message: String, details: String },
    /// An action succeeded.
    SuccessSimple { message: String },
    /// An action failed, with a description of what to do about it.
    Error { message: String, details: String },
    /// An action failed.
    ErrorSimple { message: String },
}

impl Alert {
    fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. } | Alert::ErrorSimple { .. })
    }

    pub fn into_html(self) -> Markup {
        let container_style = if self.is_error() {
            "flex items-start justify-between gap-4 p-4 mb-4 text-sm rounded-lg \
            text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400 shadow"
        } else {
            "flex items-start justify-between gap-4 p-4 mb-4 text-sm rounded-lg \
            text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400 shadow"
        };

        let (message, details) = match self {
            Alert::Success { message, details } | Alert::Error { message, details } => {
                (message, Some(details))
            }
            Alert::SuccessSimple { message } | Alert::ErrorSimple { message } => (message, None),
        };

        let dismiss_script = format!("setTimeout(() => this.remove(), {ALERT_TIMEOUT_MS})");

        html! {
            div
                role="alert"
                class=(container_style)
                "hx-on::load"=(dismiss_script)
            {
                div
                {
                    p class="font-semibold" { (message) }

                    @if let Some(details) = details {
                        @if !details.is_empty() {
                            span { (details) }
                        }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="font-bold"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        let status = if self.is_error() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };

        (status, self.into_html()).into_response()
    }
}
