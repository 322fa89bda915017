use axum::{body::Body, response::Response};

#[track_caller]
fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("{name} header missing"))
        .to_str()
        .unwrap_or_else(|error| panic!("{name} header is not text: {error}"))
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    assert_eq!(header(response, "content-type"), content_type);
}

/// Check that htmx will navigate to `endpoint` after the request.
#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(header(response, "hx-redirect"), endpoint);
}

/// Check that the browser will download the body as `file_name`.
#[track_caller]
pub(crate) fn assert_attachment(response: &Response<Body>, file_name: &str) {
    assert_eq!(
        header(response, "content-disposition"),
        format!("attachment; filename=\"{file_name}\"")
    );
}
