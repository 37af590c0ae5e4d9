//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    account::AccountId, alert::Alert, expense::ExpenseStatus, html::error_view,
    internal_server_error::InternalServerError, money::Money, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required text field was empty or only whitespace.
    ///
    /// The string is the human readable name of the field.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// The account type string did not match any known account type.
    #[error("\"{0}\" is not a valid account type")]
    InvalidAccountType(String),

    /// The specified account code already exists in the database.
    #[error("the account code \"{0}\" already exists in the database")]
    DuplicateAccountCode(String),

    /// A journal line or expense referred to an account that does not exist.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// A journal line referred to an account that has been deactivated.
    #[error("the account ID {0} is inactive and cannot be posted to")]
    InactiveAccount(AccountId),

    /// An account that the ledger needs (e.g., cash) is missing from the chart of accounts.
    #[error("no account with the code \"{0}\" exists in the chart of accounts")]
    MissingDefaultAccount(String),

    /// A journal entry was posted without any lines.
    #[error("a journal entry must have at least one line")]
    EmptyJournalEntry,

    /// A journal line had a negative amount, or did not have exactly one of
    /// debit and credit set.
    ///
    /// The number is the zero-based index of the offending line.
    #[error(
        "journal line {0} must have either a debit or a credit greater than zero, but not both"
    )]
    InvalidJournalLine(usize),

    /// The total debits of a journal entry did not equal its total credits.
    #[error("the journal entry is unbalanced: debits ({debits}) != credits ({credits})")]
    UnbalancedEntry {
        /// Total debit amount.
        debits: Money,
        /// Total credit amount.
        credits: Money,
    },

    /// An amount that must be greater than zero was zero or negative.
    #[error("the amount {0} must be greater than zero")]
    NonPositiveAmount(Money),

    /// An amount was too large to store in the database.
    #[error("the amount {0} is too large")]
    AmountOutOfRange(Decimal),

    /// A date in the future was used to record an expense or payment.
    ///
    /// Expenses and payments record events that have already happened,
    /// therefore future dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// Tried to approve or reject an expense that has already been decided.
    #[error("the expense is {0} and can no longer be approved or rejected")]
    ExpenseNotPending(ExpenseStatus),

    /// The start of a time interval was not before its end.
    #[error("the start must be before the end")]
    InvalidInterval,

    /// The requested time overlaps an existing booking for the hall.
    #[error("the hall is already booked during the requested time")]
    BookingConflict,

    /// The requested dates overlap an existing lease for the property.
    #[error("the property is already leased during the requested dates")]
    LeaseConflict,

    /// Tried to take a payment for, or cancel, a booking that has been cancelled.
    #[error("the booking has been cancelled")]
    BookingCancelled,

    /// Tried to take a payment for, or terminate, a lease that is no longer active.
    #[error("the lease is no longer active")]
    LeaseNotActive,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A foreign key constraint failed, e.g. a booking for a hall that does not exist.
    #[error("the request refers to a record that does not exist")]
    InvalidReference,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidReference
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            error if error.status_code() == StatusCode::BAD_REQUEST => {
                let page = error_view(
                    "Bad Request",
                    "400",
                    &error.client_message(),
                    "Check the values you entered and try again.",
                );

                (StatusCode::BAD_REQUEST, Html(page.into_string())).into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

/// The JSON body returned by action endpoints such as approving an expense.
#[derive(Debug, Serialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl Error {
    /// The status code to send to the client for this error.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::BookingConflict | Error::LeaseConflict | Error::ExpenseNotPending(_) => {
                StatusCode::CONFLICT
            }
            Error::EmptyField(_)
            | Error::InvalidAccountType(_)
            | Error::DuplicateAccountCode(_)
            | Error::InvalidAccount(_)
            | Error::InactiveAccount(_)
            | Error::EmptyJournalEntry
            | Error::InvalidJournalLine(_)
            | Error::UnbalancedEntry { .. }
            | Error::NonPositiveAmount(_)
            | Error::AmountOutOfRange(_)
            | Error::FutureDate(_)
            | Error::InvalidInterval
            | Error::BookingCancelled
            | Error::LeaseNotActive
            | Error::InvalidReference => StatusCode::BAD_REQUEST,
            Error::MissingDefaultAccount(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message that is safe to show to the client.
    ///
    /// Internal errors are replaced with a generic message, the details
    /// should already have been logged.
    fn client_message(&self) -> String {
        match self {
            Error::SqlError(_) | Error::DatabaseLockError => {
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            Error::NotFound => "The requested item could not be found. \
                Try refreshing the page to see if it has been deleted."
                .to_owned(),
            Error::MissingDefaultAccount(code) => format!(
                "The chart of accounts has no account with the code \"{code}\". \
                Create the account or check the server's ledger settings."
            ),
            error => {
                let message = error.to_string();
                let mut chars = message.chars();

                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => message,
                }
            }
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();
        let title = match &self {
            Error::BookingConflict | Error::LeaseConflict => "Not available",
            Error::UnbalancedEntry { .. }
            | Error::EmptyJournalEntry
            | Error::InvalidJournalLine(_) => "Could not post journal entry",
            Error::DuplicateAccountCode(_) => "Duplicate Account Code",
            Error::NotFound => "Not found",
            error if error.status_code() == StatusCode::INTERNAL_SERVER_ERROR => {
                "Something went wrong"
            }
            _ => "Invalid request",
        };
        let alert = Alert::Error {
            message: title.to_owned(),
            details: self.client_message(),
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert the error into an HTTP response with a JSON body `{success: false, message}`.
    pub fn into_json_response(self) -> Response {
        let status_code = self.status_code();
        let body = ActionResponse {
            success: false,
            message: self.client_message(),
        };

        (status_code, Json(body)).into_response()
    }
}
