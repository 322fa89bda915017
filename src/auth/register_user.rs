//! The registration page and the handler that creates an account.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{
        AccountState, EmailAddress, PasswordHash, User, ValidatedPassword, create_user,
        set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        email_input, loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// Which field an error message belongs under.
#[derive(Default)]
struct FormErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: &FormErrors<'_>) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input(PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", &FormErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Validate the form and insert the new user.
fn register(state: &AccountState, form: &RegisterForm) -> Result<User, Error> {
    let email = EmailAddress::new(&form.email)?;

    if form.password != form.confirm_password {
        return Err(Error::PasswordMismatch);
    }

    let validated_password = ValidatedPassword::new(&form.password, &[email.as_str()])?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(email, password_hash, &connection)
}

/// Create an account, sign the new user in and send them to the dashboard.
///
/// Validation problems are shown inline under the field they belong to.
pub async fn register_user(
    State(state): State<AccountState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let user = match register(&state, &user_data) {
        Ok(user) => user,
        Err(error) => {
            let message = error.to_string();
            let errors = match error {
                Error::InvalidEmail(_) | Error::DuplicateEmail => FormErrors {
                    email: Some(&message),
                    ..Default::default()
                },
                Error::TooWeak(_) => FormErrors {
                    password: Some(&message),
                    ..Default::default()
                },
                Error::PasswordMismatch => FormErrors {
                    confirm_password: Some(&message),
                    ..Default::default()
                },
                error => {
                    tracing::error!("An unhandled error occurred while registering a user: {error}");
                    return get_internal_server_error_redirect();
                }
            };

            return registration_form(&user_data.email, &errors).into_response();
        }
    };

    tracing::info!("Registered user {}", user.id);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    match set_auth_cookie(
        jar,
        user.id,
        user.email.as_str(),
        state.cookie_duration,
        local_offset,
    ) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}
