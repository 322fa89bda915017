use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

/// Check that htmx sends the form to `endpoint`, e.g. `attribute = "hx-put"`.
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

/// The required input called `name`, checked to be of `type_`.
#[track_caller]
fn must_get_required_input<'a>(form: &ElementRef<'a>, name: &str, type_: &str) -> ElementRef<'a> {
    let selector = Selector::parse(&format!("input[name=\"{name}\"]")).unwrap();
    let input = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));

    let got_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(
        got_type, type_,
        "want input {name} with type \"{type_}\", got {got_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to have the required attribute but got none"
    );

    input
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    must_get_required_input(form, name, type_);
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let input = must_get_required_input(form, name, type_);
    let got_value = input.value().attr("value").unwrap_or_default();

    assert_eq!(
        got_value, value,
        "want input {name} with value \"{value}\", got {got_value:?}"
    );
}

#[track_caller]
fn must_get_submit_button<'a>(form: &ElementRef<'a>) -> ElementRef<'a> {
    form.select(&Selector::parse("button[type=submit]").unwrap())
        .next()
        .expect("No submit button found")
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    must_get_submit_button(form);
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let got_text = must_get_submit_button(form).text().collect::<String>();

    assert_eq!(text, got_text.trim());
}
