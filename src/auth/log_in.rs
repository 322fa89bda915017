//! The log-in page and the handler that checks an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{EmailAddress, User, get_user_by_email, normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, email_input, loading_spinner, log_in_register,
        password_input,
    },
    timezone::get_local_offset,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// The state needed by the log-in and registration handlers.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database holding registered users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AccountState {
    /// The account state for a server with a user database.
    ///
    /// Returns `None` for the local snapshot, which has no users.
    pub fn from_app_state(state: &AppState) -> Option<Self> {
        let db_connection = state.db_connection.clone()?;

        Some(Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AccountState> for Key {
    fn from_ref(state: &AccountState) -> Self {
        state.cookie_key.clone()
    }
}

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (email_input(email, None))
            (password_input(0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let redirect_url = raw_url.and_then(normalize_redirect_url);

    if let (None, Some(raw_url)) = (&redirect_url, raw_url) {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// The raw data entered by the user in the log-in form.
///
/// The password is kept as a plain string. It is only compared against the stored hash.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,

    /// Password entered during log-in.
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set.
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Look up the user for `email` and check `password` against their hash.
fn verify_credentials(state: &AccountState, email: &str, password: &str) -> Result<User, Error> {
    let email = EmailAddress::new(email).map_err(|_| Error::InvalidCredentials)?;
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            result => result?,
        }
    };

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

/// Handler for log-in requests via the POST method.
///
/// On success the auth cookie is set and the client is redirected to the
/// dashboard, or to the page they were trying to reach. Otherwise the form is
/// returned with an error message.
pub async fn post_log_in(
    State(state): State<AccountState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let user = match verify_credentials(&state, &user_data.email, &user_data.password) {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            tracing::info!("Failed log-in attempt for {}", user_data.email.trim());
            return log_in_form(
                &user_data.email,
                Some(INVALID_CREDENTIALS_ERROR_MSG),
                redirect_url,
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(&user_data.email, Some(INTERNAL_ERROR_MSG), redirect_url)
                .into_response();
        }
    };

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    match set_auth_cookie(
        jar,
        user.id,
        user.email.as_str(),
        cookie_duration,
        local_offset,
    ) {
        Ok(jar) => {
            tracing::info!("User {} logged in", user.id);
            (
                StatusCode::SEE_OTHER,
                HxRedirect(redirect_url.to_owned()),
                jar,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                (),
            )
                .into_response()
        }
    }
}


#[cfg(test)]
mod log_in_page_tests {
    use axum::extract::Query;
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::{RedirectQuery, get_log_in_page};

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None })).await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::LOG_IN_API, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);

        let links = form
            .select(&Selector::parse("a[href]").unwrap())
            .map(|link| link.value().attr("href").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(links, vec![endpoints::REGISTER_VIEW]);
    }

    #[tokio::test]
    async fn log_in_page_preserves_redirect_url() {
        let redirect_url = "/dashboard?period=week".to_string();
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some(redirect_url.clone()),
        }))
        .await;

        let document = parse_html_document(response).await;
        let input_selector = Selector::parse("input[name=redirect_url]").unwrap();
        let inputs = document.select(&input_selector).collect::<Vec<_>>();
        assert_eq!(inputs.len(), 1, "want 1 redirect_url input");
        assert_eq!(
            inputs[0].value().attr("value"),
            Some(redirect_url.as_str()),
            "expected redirect_url value to be preserved"
        );
    }
}
