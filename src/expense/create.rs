//! The page and endpoint for recording a new expense.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, AccountType, get_all_accounts},
    endpoints,
    expense::{NewExpense, create_expense, expenses_page::ExpenseState},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        date_datetime_attr, dollar_input_styles,
    },
    money::Money,
    navigation::NavBar,
    timezone::get_local_today,
};

/// Form data for recording an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseFormData {
    pub date: Date,
    pub description: String,
    pub amount: Money,
    /// Left empty to use the default expense account.
    pub account_id: Option<AccountId>,
}

/// Render the page for recording an expense.
pub async fn get_new_expense_page(State(state): State<ExpenseState>) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_expense_accounts(&connection)?;

    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW).into_html();
    let form = new_expense_form_view(&accounts, today, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base("Record Expense", &[dollar_input_styles()], &content).into_response())
}

/// Handle the expense form submission.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_expense = NewExpense {
        date: form.date,
        description: form.description,
        amount: form.amount,
        account_id: form.account_id,
    };

    match create_expense(new_expense, today, &connection) {
        Ok(expense) => {
            tracing::info!(
                "recorded expense {} of {} on {}",
                expense.id,
                expense.amount,
                expense.date
            );

            (
                HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ (Error::EmptyField(_)
            | Error::NonPositiveAmount(_)
            | Error::AmountOutOfRange(_)
            | Error::FutureDate(_)
            | Error::InvalidAccount(_)),
        ) => match get_expense_accounts(&connection) {
            Ok(accounts) => {
                new_expense_form_view(&accounts, today, &format!("Error: {error}")).into_response()
            }
            Err(error) => error.into_alert_response(),
        },
        Err(error) => error.into_alert_response(),
    }
}

fn get_expense_accounts(connection: &rusqlite::Connection) -> Result<Vec<Account>, Error> {
    Ok(get_all_accounts(connection)?
        .into_iter()
        .filter(|account| account.account_type == AccountType::Expense && account.is_active)
        .collect())
}

fn new_expense_form_view(accounts: &[Account], today: Date, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_EXPENSE)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    required
                    value=(date_datetime_attr(today))
                    max=(date_datetime_attr(today))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Cleaning supplies"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        id="amount"
                        type="number"
                        name="amount"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Expense account" }

                select id="account_id" name="account_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Default" }

                    @for account in accounts {
                        option value=(account.id) { (account.code) " " (account.name) }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record Expense" }
        }
    }
}

#[cfg(test)]
mod new_expense_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        config::LedgerConfig,
        db::initialize,
        endpoints,
        expense::{expenses_page::ExpenseState, get_new_expense_page},
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let state = ExpenseState {
            local_timezone: "Etc/UTC".to_owned(),
            ledger_config: LedgerConfig::default(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_new_expense_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_EXPENSE, "hx-post");
        assert_form_input(&form, "date", "date");
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_submit_button(&form);
        let options: Vec<String> = form
            .select(&Selector::parse("select[name=account_id] option").unwrap())
            .map(|option| option.text().collect())
            .collect();
        assert_eq!(options, vec!["Default", "5000 General Expenses"]);
    }
}
