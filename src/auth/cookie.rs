//! Reading and writing the private session cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    auth::{Token, UserID},
};

pub(crate) const COOKIE_TOKEN: &str = "token";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Add the session cookie for `user_id` to the cookie jar.
///
/// The cookie expires `duration` from now. `local_offset` is the offset the
/// expiry is recorded in.
///
/// # Errors
///
/// Returns [Error::JSONSerializationError] if the token could not be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    email: &str,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc().to_offset(local_offset) + duration;
    let token = Token {
        user_id,
        email: email.to_owned(),
        expires_at,
    };

    Ok(jar.add(build_token_cookie(&token)?))
}

fn build_token_cookie(token: &Token) -> Result<Cookie<'static>, Error> {
    let token_string = serde_json::to_string(token)?;

    Ok(Cookie::build((COOKIE_TOKEN, token_string))
        .expires(token.expires_at)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build())
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read and check the session token in `jar`.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no session cookie,
/// - [Error::InvalidCookie] if the cookie cannot be decoded or has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidCookie(error.to_string()))?;

    if token.has_expired(OffsetDateTime::now_utc()) {
        return Err(Error::InvalidCookie("the session has expired".to_owned()));
    }

    Ok(token)
}

/// Set the expiry of the session cookie in `jar` to the latest of now plus
/// `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::CookieMissing] or [Error::InvalidCookie] if there is no valid session cookie,
/// - [Error::InvalidDateFormat] if extending the cookie by `duration` would overflow the date time.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let mut token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .to_offset(local_offset)
        .checked_add(duration)
        .ok_or_else(|| {
            Error::InvalidDateFormat(
                "expiry overflowed".to_owned(),
                format!("{} + {duration}", token.expires_at),
            )
        })?;

    token.expires_at = max(token.expires_at, new_expiry);

    Ok(jar.add(build_token_cookie(&token)?))
}
