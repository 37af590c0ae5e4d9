//! Displays the chart of accounts.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountId, AccountType, get_all_accounts, toggle_account_active},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_ACTION_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency, page_header,
    },
    ledger::get_balance_as_of,
    money::Money,
    navigation::NavBar,
    timezone::get_local_today,
};

/// The state needed for the account route handlers.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The account data to display in the view
#[derive(Debug, PartialEq)]
struct AccountTableRow {
    code: String,
    name: String,
    account_type: AccountType,
    is_active: bool,
    /// The balance on the account's normal side.
    balance: Money,
    ledger_url: String,
    toggle_url: String,
}

impl AccountTableRow {
    /// `balance` is the account's debits minus credits.
    fn new(account: Account, balance: Money) -> Self {
        Self {
            code: account.code,
            name: account.name,
            account_type: account.account_type,
            is_active: account.is_active,
            balance: account.account_type.normal_balance().signed(balance),
            ledger_url: format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, account.id),
            toggle_url: format_endpoint(endpoints::TOGGLE_ACCOUNT, account.id),
        }
    }
}

fn accounts_view(accounts: &[AccountTableRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &AccountTableRow| {
        let toggle_text = if account.is_active {
            "Deactivate"
        } else {
            "Activate"
        };

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (account.code) }

                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)
                }

                td class=(TABLE_CELL_STYLE) { (account.account_type) }

                td class=(TABLE_CELL_STYLE) { (account.account_type.normal_balance()) }

                td class="px-6 py-4 text-right" { (format_currency(account.balance)) }

                td class=(TABLE_CELL_STYLE)
                {
                    @if account.is_active {
                        span class=(BADGE_STYLE) { "Active" }
                    } @else {
                        span class=(BADGE_STYLE) { "Inactive" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        a href=(account.ledger_url) class=(LINK_STYLE) { "Ledger" }

                        button
                            type="button"
                            hx-put=(account.toggle_url)
                            hx-target-error="#alert-container"
                            class=(BUTTON_ACTION_STYLE)
                        {
                            (toggle_text)
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
                (page_header("Accounts", Some((endpoints::NEW_ACCOUNT_VIEW, "Add Account"))))

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Normal Balance" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="7"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Create an account "
                                        a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

/// Renders the accounts page showing the chart of accounts and each account's balance as of today.
pub async fn get_accounts_page(State(state): State<AccountState>) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_all_accounts(&connection)
        .inspect_err(|error| tracing::error!("could not get all accounts: {error}"))?
        .into_iter()
        .map(|account| {
            let balance = get_balance_as_of(account.id, today, &connection)?;
            Ok(AccountTableRow::new(account, balance))
        })
        .collect::<Result<Vec<AccountTableRow>, Error>>()?;

    Ok(accounts_view(&accounts).into_response())
}

/// Activate an inactive account, or deactivate an active one, then reload the accounts page.
pub async fn toggle_account_endpoint(
    State(state): State<AccountState>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match toggle_account_active(account_id, &connection) {
        Ok(is_active) => {
            tracing::info!("account {account_id} is now active: {is_active}");

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod accounts_view_tests {
    use scraper::{Html, Selector};

    use rust_decimal_macros::dec;

    use crate::{
        account::{Account, AccountType, accounts_page::AccountTableRow},
        endpoints::{self, format_endpoint},
        money::Money,
        test_utils::assert_valid_html,
    };

    use super::accounts_view;

    #[test]
    fn renders_account_rows() {
        let accounts = vec![AccountTableRow::new(
            Account {
                id: 3,
                code: "1000".to_owned(),
                name: "Cash".to_owned(),
                account_type: AccountType::Asset,
                is_active: true,
            },
            Money::new(dec!(1250.5)),
        )];

        let html = Html::parse_document(&accounts_view(&accounts).into_string());

        assert_valid_html(&html);
        let rows: Vec<_> = html
            .select(&Selector::parse("tbody tr").unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        let row_text = rows[0].text().collect::<String>();
        assert!(row_text.contains("1000"));
        assert!(row_text.contains("Cash"));
        assert!(row_text.contains("Debit"));
        assert!(row_text.contains("$1,250.50"));
        assert!(row_text.contains("Deactivate"));

        let ledger_link = rows[0]
            .select(&Selector::parse("a").unwrap())
            .next()
            .expect("No ledger link found");
        assert_eq!(
            ledger_link.value().attr("href"),
            Some(format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, 3).as_str())
        );
    }

    #[test]
    fn renders_link_to_create_account_when_empty() {
        let html = Html::parse_document(&accounts_view(&[]).into_string());

        assert_valid_html(&html);
        let cell = html
            .select(&Selector::parse("tbody td").unwrap())
            .next()
            .expect("No empty table message found");
        let link = cell
            .select(&Selector::parse("a").unwrap())
            .next()
            .expect("No link found");
        assert_eq!(link.value().attr("href"), Some(endpoints::NEW_ACCOUNT_VIEW));
    }
}


#[cfg(test)]
mod toggle_account_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        account::get_account_by_code,
        endpoints,
        test_utils::{assert_hx_redirect, open_test_db},
    };

    use super::{AccountState, toggle_account_endpoint};

    fn get_state() -> AccountState {
        let connection = open_test_db();

        AccountState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deactivates_account() {
        let state = get_state();
        let cash_id = get_account_by_code("1000", &state.db_connection.lock().unwrap())
            .unwrap()
            .id;

        let response = toggle_account_endpoint(State(state.clone()), Path(cash_id)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);
        let cash = get_account_by_code("1000", &state.db_connection.lock().unwrap()).unwrap();
        assert!(!cash.is_active);
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let response = toggle_account_endpoint(State(get_state()), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
