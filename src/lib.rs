//! Backoffice is a web app for running a small venue and property business.
//!
//! It keeps a double-entry ledger, takes hall bookings and property leases,
//! and tracks expenses through an approval workflow. Approved expenses and
//! received payments are posted to the ledger automatically.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod availability;
mod booking;
mod config;
mod database_id;
mod db;
mod endpoints;
mod error;
mod expense;
mod html;
mod internal_server_error;
mod lease;
mod ledger;
mod logging;
mod money;
mod navigation;
mod not_found;
mod payment;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use account::get_account_by_code;
pub use app_state::AppState;
pub use booking::{NewBooking, create_booking, create_hall};
pub use config::LedgerConfig;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{NewExpense, approve_expense, create_expense};
pub use lease::{NewLease, create_lease, create_property};
pub use ledger::{
    NewJournalEntry, NewJournalLine, ReferenceType, get_journal_entry, post_journal_entry,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Money;
pub use payment::{Payment, get_payments, record_booking_payment, record_rent_payment};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
