//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        DEFAULT_COOKIE_DURATION, UserID, build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url_from_target,
    },
    endpoints,
    timezone::get_local_offset,
};

/// The signed-in user, placed into request extensions by the auth guard.
///
/// Handlers that also serve the local snapshot take `Option<Extension<Identity>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The user's database ID.
    pub id: UserID,
    /// The address the user signed in with.
    pub email: String,
}

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// What an anonymous request gets back instead of the page it asked for.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    /// A 303 to the log-in page, for full page loads.
    Redirect,
    /// A 200 with `HX-Redirect`, so htmx navigates instead of swapping in the log-in page.
    HxRedirect,
}

impl Rejection {
    fn respond(self, log_in_url: String) -> Response {
        match self {
            Rejection::Redirect => Redirect::to(&log_in_url).into_response(),
            Rejection::HxRedirect => (HxRedirect(log_in_url), StatusCode::OK).into_response(),
        }
    }
}

/// The log-in URL that sends the user back to where they were.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        tracing::warn!(
            "No usable redirect target for {}, falling back to the dashboard",
            request.uri().path()
        );

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Copy the refreshed session cookie from `jar` onto `response`.
///
/// A cookie that cannot be extended is left as it was.
fn refresh_session(jar: PrivateCookieJar, local_offset: UtcOffset, response: &mut Response) {
    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        DEFAULT_COOKIE_DURATION,
        local_offset,
    ) {
        Ok(extended) => extended,
        Err(error) => {
            tracing::error!("Could not extend the session cookie: {error}");
            jar
        }
    };

    let headers = response.headers_mut();
    for cookie in jar.into_response().headers().get_all(SET_COOKIE) {
        headers.append(SET_COOKIE, cookie.to_owned());
    }
}

async fn guard(state: AuthState, request: Request, next: Next, rejection: Rejection) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Invalid timezone {}, sending the user to log in",
            state.local_timezone
        );
        return rejection.respond(log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read the cookie jar: {error:?}");
            return rejection.respond(log_in_url);
        }
    };

    match get_token_from_cookies(&jar) {
        Ok(token) => {
            parts.extensions.insert(token.identity());
        }
        Err(error) => {
            tracing::debug!("Rejected session cookie: {error}");
            return rejection.respond(log_in_url);
        }
    }

    let mut response = next.run(Request::from_parts(parts, body)).await;
    refresh_session(jar, local_offset, &mut response);

    response
}

/// Guard for pages: anonymous requests are redirected to the log-in page.
///
/// Route handlers can use `Extension(identity): Extension<Identity>` to receive the signed-in user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, Rejection::Redirect).await
}

/// Guard for htmx calls: anonymous requests get an `HX-Redirect` to the log-in page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, Rejection::HxRedirect).await
}
