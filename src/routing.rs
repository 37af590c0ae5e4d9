//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, get_accounts_page, get_new_account_page, toggle_account_endpoint,
    },
    booking::{
        cancel_booking_endpoint, create_booking_endpoint, create_hall_endpoint, get_bookings_page,
    },
    endpoints,
    expense::{
        approve_expense_endpoint, create_expense_endpoint, get_expenses_page,
        get_new_expense_page, reject_expense_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    lease::{
        create_lease_endpoint, create_property_endpoint, get_leases_page,
        terminate_lease_endpoint,
    },
    ledger::{get_account_ledger_page, get_journal_page, get_trial_balance_page},
    not_found::get_404_not_found,
    payment::{create_booking_payment_endpoint, create_lease_payment_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::JOURNAL_VIEW, get(get_journal_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_new_account_page))
        .route(endpoints::ACCOUNT_LEDGER_VIEW, get(get_account_ledger_page))
        .route(endpoints::TRIAL_BALANCE_VIEW, get(get_trial_balance_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::BOOKINGS_VIEW, get(get_bookings_page))
        .route(endpoints::LEASES_VIEW, get(get_leases_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(endpoints::POST_ACCOUNT, post(create_account_endpoint))
        .route(endpoints::TOGGLE_ACCOUNT, put(toggle_account_endpoint))
        .route(endpoints::POST_EXPENSE, post(create_expense_endpoint))
        .route(endpoints::APPROVE_EXPENSE, post(approve_expense_endpoint))
        .route(endpoints::REJECT_EXPENSE, post(reject_expense_endpoint))
        .route(endpoints::POST_HALL, post(create_hall_endpoint))
        .route(endpoints::POST_BOOKING, post(create_booking_endpoint))
        .route(endpoints::CANCEL_BOOKING, delete(cancel_booking_endpoint))
        .route(
            endpoints::POST_BOOKING_PAYMENT,
            post(create_booking_payment_endpoint),
        )
        .route(endpoints::POST_PROPERTY, post(create_property_endpoint))
        .route(endpoints::POST_LEASE, post(create_lease_endpoint))
        .route(endpoints::TERMINATE_LEASE, post(terminate_lease_endpoint))
        .route(
            endpoints::POST_LEASE_PAYMENT,
            post(create_lease_payment_endpoint),
        );

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the journal page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::JOURNAL_VIEW)
}
