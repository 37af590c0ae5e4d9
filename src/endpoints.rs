//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}/ledger', use [format_endpoint].

/// The root route which redirects to the journal.
pub const ROOT: &str = "/";
/// The page listing recent journal entries.
pub const JOURNAL_VIEW: &str = "/journal";
/// The page listing the chart of accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page showing the general ledger of one account with running balances.
pub const ACCOUNT_LEDGER_VIEW: &str = "/accounts/{account_id}/ledger";
/// The trial balance report.
pub const TRIAL_BALANCE_VIEW: &str = "/reports/trial-balance";
/// The page listing expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for recording a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
/// The page listing hall bookings.
pub const BOOKINGS_VIEW: &str = "/bookings";
/// The page listing property leases.
pub const LEASES_VIEW: &str = "/leases";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create an account.
pub const POST_ACCOUNT: &str = "/api/accounts";
/// The route to activate or deactivate an account.
pub const TOGGLE_ACCOUNT: &str = "/api/accounts/{account_id}/active";
/// The route to record an expense.
pub const POST_EXPENSE: &str = "/api/expenses";
/// The route to approve an expense and post it to the ledger.
pub const APPROVE_EXPENSE: &str = "/api/expenses/{expense_id}/approve";
/// The route to reject an expense.
pub const REJECT_EXPENSE: &str = "/api/expenses/{expense_id}/reject";
/// The route to add a hall that can be booked.
pub const POST_HALL: &str = "/api/halls";
/// The route to book a hall.
pub const POST_BOOKING: &str = "/api/bookings";
/// The route to cancel a booking.
pub const CANCEL_BOOKING: &str = "/api/bookings/{booking_id}";
/// The route to record a payment for a booking.
pub const POST_BOOKING_PAYMENT: &str = "/api/bookings/{booking_id}/payments";
/// The route to add a property that can be leased.
pub const POST_PROPERTY: &str = "/api/properties";
/// The route to lease a property.
pub const POST_LEASE: &str = "/api/leases";
/// The route to terminate a lease.
pub const TERMINATE_LEASE: &str = "/api/leases/{lease_id}/terminate";
/// The route to record a rent payment for a lease.
pub const POST_LEASE_PAYMENT: &str = "/api/leases/{lease_id}/payments";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
