//! Displays expenses and handles approving and rejecting them.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_all_accounts},
    config::LedgerConfig,
    endpoints::{self, format_endpoint},
    error::ActionResponse,
    expense::{
        Expense, ExpenseId, ExpenseStatus, approve_expense, get_all_expenses, reject_expense,
    },
    html::{
        BADGE_STYLE, BUTTON_ACTION_STYLE, BUTTON_DELETE_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
        date_datetime_attr, format_currency, page_header,
    },
    navigation::NavBar,
};

/// The state needed for the expense route handlers.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub ledger_config: LedgerConfig,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            ledger_config: state.ledger_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the list of expenses.
pub async fn get_expenses_page(State(state): State<ExpenseState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_all_expenses(&connection)?;
    let accounts: HashMap<AccountId, Account> = get_all_accounts(&connection)?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    Ok(expenses_view(&expenses, &accounts, &state.ledger_config).into_response())
}

fn expenses_view(
    expenses: &[Expense],
    accounts: &HashMap<AccountId, Account>,
    ledger_config: &LedgerConfig,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let account_label = |expense: &Expense| match expense.account_id {
        Some(account_id) => accounts
            .get(&account_id)
            .map(|account| format!("{} {}", account.code, account.name))
            .unwrap_or_else(|| format!("Account #{account_id}")),
        None => format!("Default ({})", ledger_config.expense_account_code),
    };

    let table_row = |expense: &Expense| {
        html!(
            tr class=(TABLE_ROW_STYLE) data-expense-id=(expense.id)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(date_datetime_attr(expense.date)) { (expense.date) }
                }
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                {
                    (expense.description)
                }
                td class=(TABLE_CELL_STYLE) { (account_label(expense)) }
                td class="px-6 py-4 text-right" { (format_currency(expense.amount)) }
                td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (expense.status) } }
                td class=(TABLE_CELL_STYLE)
                {
                    @if expense.status == ExpenseStatus::Pending {
                        div class="flex gap-4"
                        {
                            button
                                type="button"
                                hx-post=(format_endpoint(endpoints::APPROVE_EXPENSE, expense.id))
                                hx-swap="none"
                                class=(BUTTON_ACTION_STYLE)
                            {
                                "Approve"
                            }

                            button
                                type="button"
                                hx-post=(format_endpoint(endpoints::REJECT_EXPENSE, expense.id))
                                hx-swap="none"
                                hx-confirm="Reject this expense?"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Reject"
                            }
                        }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Expenses", Some((endpoints::NEW_EXPENSE_VIEW, "Record Expense"))))

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for expense in expenses {
                                (table_row(expense))
                            }

                            @if expenses.is_empty() {
                                tr
                                {
                                    td colspan="6" class="px-6 py-4 text-center" { "No expenses recorded." }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Expenses", &[], &content)
}

/// A route handler that approves an expense and posts it to the ledger.
///
/// Responds with JSON `{success, message}`, on success the `HX-Refresh`
/// header tells HTMX to reload the list.
pub async fn approve_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match approve_expense(expense_id, &state.ledger_config, &connection) {
        Ok(entry) => {
            tracing::info!(
                "approved expense {expense_id}, posted as {}",
                entry.entry_number
            );

            let body = ActionResponse {
                success: true,
                message: format!("Expense approved and posted as {}", entry.entry_number),
            };

            (HxRefresh(true), Json(body)).into_response()
        }
        Err(error) => {
            tracing::warn!("could not approve expense {expense_id}: {error}");
            error.into_json_response()
        }
    }
}

/// A route handler that rejects an expense.
///
/// Responds with JSON `{success, message}`.
pub async fn reject_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match reject_expense(expense_id, &connection) {
        Ok(()) => {
            tracing::info!("rejected expense {expense_id}");

            let body = ActionResponse {
                success: true,
                message: "Expense rejected".to_owned(),
            };

            (HxRefresh(true), Json(body)).into_response()
        }
        Err(error) => error.into_json_response(),
    }
}
