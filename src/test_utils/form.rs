use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("page has no form")
}

/// Check the form submits to `endpoint` via the htmx attribute `attribute`, e.g. "hx-post".
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("form has no {attribute} attribute"));

    assert_eq!(got, endpoint, "form {attribute} points to the wrong endpoint");
}

/// Check the form has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
    let input = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("form has no input named {name:?}"));

    assert_eq!(
        input.value().attr("type").unwrap_or_default(),
        type_,
        "input {name:?} has the wrong type"
    );
    assert!(
        input.value().attr("required").is_some(),
        "input {name:?} should be required"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let button = form
        .select(&Selector::parse("button[type=submit]").unwrap())
        .next();

    assert!(button.is_some(), "form has no submit button");
}

/// Check the text of the first paragraph in the form, where validation errors are shown.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let error_message: String = form
        .select(&Selector::parse("p").unwrap())
        .next()
        .expect("form shows no error message")
        .text()
        .collect();

    assert_eq!(want_error_message, error_message.trim());
}
