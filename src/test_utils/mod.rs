//! Assertions and fixtures shared by the handler and page tests.

#![allow(missing_docs)]

mod form;
mod html;

use rusqlite::Connection;

use crate::db::initialize;

pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
    must_get_form,
};
pub(crate) use html::{
    assert_content_type, assert_hx_redirect, assert_valid_html, parse_html_document,
    parse_html_fragment, table_rows,
};

/// An in-memory database with the schema and default chart of accounts.
pub(crate) fn open_test_db() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");

    connection
}
