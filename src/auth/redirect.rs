//! Where to send a user after they sign in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Only same-site paths are followed, and never back to the log-in page.
fn is_safe_redirect_path(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && path != endpoints::REGISTER_VIEW
}

/// Reduce a redirect target from a query string or form to a safe local path.
///
/// Absolute URLs are rejected so the log-in page cannot be used as an open redirect.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();
    is_safe_redirect_path(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that returns the user to where `request` was headed.
///
/// htmx API calls and fragment requests are sent back to the page they were
/// made from, taken from the `HX-Current-URL` header, since the route itself
/// is not a page.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") || is_hx_request(request) {
        redirect_target_from_hx_request(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    serde_urlencoded::to_string([("redirect_url", redirect_target)])
        .inspect_err(|error| {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}")
        })
        .ok()
        .map(|param| format!("{}?{}", endpoints::LOG_IN_VIEW, param))
}

fn is_hx_request(request: &Request) -> bool {
    request
        .headers()
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"))
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();

    if !is_hx_request(request) {
        tracing::warn!("Missing HX-Request header for {}.", request.uri().path());
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for {}.", request.uri().path());
        return None;
    };

    // The header holds an absolute URL, keep only the local part.
    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|path_and_query| is_safe_redirect_path(path_and_query));

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}
