use axum::{body::Body, response::Response};
use scraper::{ElementRef, Html, Selector};

async fn read_body(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    String::from_utf8_lossy(&body).into_owned()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&read_body(response).await)
}

pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&read_body(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The table rows carrying the data attribute `data_attribute`, e.g. "data-booking-id".
pub(crate) fn table_rows<'a>(html: &'a Html, data_attribute: &str) -> Vec<ElementRef<'a>> {
    let selector = Selector::parse(&format!("tr[{data_attribute}]")).unwrap();

    html.select(&selector).collect()
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    let header = response
        .headers()
        .get("content-type")
        .expect("content-type header missing");

    assert_eq!(header, content_type);
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    let header = response
        .headers()
        .get("hx-redirect")
        .expect("hx-redirect header missing");

    assert_eq!(header, endpoint);
}
