//! A personal and family finance tracker.
//!
//! Income and expense transactions are recorded through server-rendered forms,
//! filtered by period, type and category, and summarised with totals and charts.
//! Transactions live either in a local JSON snapshot file or in a live SQLite
//! collection that pushes fresh snapshots to every subscribed session. The live
//! collection sits behind an email and password log-in.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod config;
mod dashboard;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod persistence;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    EmailAddress, PasswordHash, User, UserID, ValidatedPassword, create_user, create_user_table,
};
pub use config::{BackendKind, SharingMode, StorageConfig};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use persistence::{LiveCollectionAdapter, LocalSnapshotAdapter, Scope};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{
    Attribution, Category, Transaction, TransactionFields, TransactionId, TransactionType,
};

use crate::{
    alert::Alert,
    internal_server_error::{InternalServerError, render_internal_server_error},
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth cookie could not be decoded, or it has expired.
    #[error("the auth cookie is invalid: {0}")]
    InvalidCookie(String),

    /// There was an error creating the new expiry date time for a cookie.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// A request for a live collection was made without a signed-in user.
    #[error("a signed-in user is required to access the live collection")]
    Unauthenticated,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The two passwords entered during registration are different.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The text entered as an email address is not an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user with the email address has already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A transaction amount was negative or not a finite number.
    ///
    /// The sign of a transaction is given by its type, so amounts are always
    /// non-negative magnitudes.
    #[error("{0} is not a valid amount, amounts must be zero or more")]
    InvalidAmount(f64),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Reading or writing the local snapshot file failed.
    #[error("could not access the snapshot file: {0}")]
    StorageError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded file is not a list of transactions.
    #[error("Could not read the import file: {0}")]
    InvalidImportFile(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the in-memory transaction list
    #[error("could not acquire the transaction store lock")]
    StoreLockError,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the collection")]
    UpdateMissingTransaction,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerError {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                })
            }
            Error::StorageError(_) => render_internal_server_error(InternalServerError {
                description: "Could not load your transactions",
                fix: "Check that the data file exists and is readable, then try again.",
            }),
            Error::DatabaseLockError | Error::StoreLockError => {
                render_internal_server_error(Default::default())
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("{amount} is not a valid amount. Enter zero or more."),
                },
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found. \
                    It may have been deleted by another member of your household."
                        .to_owned(),
                },
            ),
            Error::MultipartError(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the upload".to_owned(),
                    details,
                },
            ),
            Error::InvalidImportFile(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid import file".to_owned(),
                    details,
                },
            ),
            Error::StorageError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Could not save your changes".to_owned(),
                    details: "The data file could not be written. Check the server logs."
                        .to_owned(),
                },
            ),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Alert::ErrorSimple {
                    message: "Please log in again".to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status, alert.into_html()).into_response()
    }
}
