//! Displays the most recent journal entries.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_all_accounts},
    endpoints,
    html::{
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        base, date_datetime_attr, format_currency, page_header,
    },
    ledger::{JournalEntry, get_recent_journal_entries},
    navigation::NavBar,
};

/// The number of entries shown on the journal page.
const JOURNAL_PAGE_LIMIT: u32 = 50;

/// The state needed for the ledger report pages.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the journal page listing the most recent entries and their lines.
pub async fn get_journal_page(State(state): State<LedgerState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = get_recent_journal_entries(JOURNAL_PAGE_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("could not get journal entries: {error}"))?;
    let accounts: HashMap<AccountId, Account> = get_all_accounts(&connection)?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    Ok(journal_view(&entries, &accounts).into_response())
}

fn account_label(account_id: AccountId, accounts: &HashMap<AccountId, Account>) -> String {
    match accounts.get(&account_id) {
        Some(account) => format!("{} {}", account.code, account.name),
        None => format!("Account #{account_id}"),
    }
}

fn journal_view(entries: &[JournalEntry], accounts: &HashMap<AccountId, Account>) -> Markup {
    let nav_bar = NavBar::new(endpoints::JOURNAL_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Journal", None))

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Entry" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account / Description" }
                                th scope="col" class="px-6 py-3 text-right" { "Debit" }
                                th scope="col" class="px-6 py-3 text-right" { "Credit" }
                            }
                        }

                        @for entry in entries {
                            tbody data-entry-number=(entry.entry_number)
                            {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    th
                                        scope="row"
                                        class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                                    {
                                        (entry.entry_number)
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        time datetime=(date_datetime_attr(entry.date)) { (entry.date) }
                                    }
                                    td class=(TABLE_CELL_STYLE) colspan="3"
                                    {
                                        (entry.description)

                                        @if let (Some(reference_type), Some(reference_id)) = (entry.reference_type, entry.reference_id) {
                                            " (" (reference_type) " #" (reference_id) ")"
                                        }
                                    }
                                }

                                @for line in &entry.lines {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td class=(TABLE_CELL_STYLE) {}
                                        td class=(TABLE_CELL_STYLE) {}
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            @if line.credit.is_positive() {
                                                span class="pl-6" { (account_label(line.account_id, accounts)) }
                                            } @else {
                                                (account_label(line.account_id, accounts))
                                            }
                                        }
                                        td class="px-6 py-4 text-right"
                                        {
                                            @if line.debit.is_positive() { (format_currency(line.debit)) }
                                        }
                                        td class="px-6 py-4 text-right"
                                        {
                                            @if line.credit.is_positive() { (format_currency(line.credit)) }
                                        }
                                    }
                                }
                            }
                        }

                        @if entries.is_empty() {
                            tbody
                            {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing has been posted to the ledger yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Journal", &[], &content)
}

#[cfg(test)]
mod journal_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        account::get_account_by_code,
        ledger::{NewJournalEntry, NewJournalLine, ReferenceType, post_journal_entry},
        money::Money,
        test_utils::{assert_valid_html, open_test_db, parse_html_document},
    };

    use super::{LedgerState, get_journal_page};

    fn get_state() -> LedgerState {
        let connection = open_test_db();

        LedgerState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn shows_entries_with_lines() {
        let state = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let cash_id = get_account_by_code("1000", &connection).unwrap().id;
            let expense_id = get_account_by_code("5000", &connection).unwrap().id;
            let amount = Money::new(dec!(500));
            post_journal_entry(
                NewJournalEntry {
                    date: date!(2024 - 01 - 10),
                    description: "Cleaning supplies".to_owned(),
                    lines: vec![
                        NewJournalLine::debit(expense_id, amount, ""),
                        NewJournalLine::credit(cash_id, amount, ""),
                    ],
                    reference_type: Some(ReferenceType::Expense),
                    reference_id: Some(1),
                    source: "test".to_owned(),
                },
                &connection,
            )
            .unwrap();
        }

        let response = get_journal_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let entry = html
            .select(&Selector::parse("tbody[data-entry-number='JE-000001']").unwrap())
            .next()
            .expect("No journal entry found");
        let rows = entry.select(&Selector::parse("tr").unwrap()).count();
        assert_eq!(rows, 3);
        let text = entry.text().collect::<String>();
        assert!(text.contains("Cleaning supplies"));
        assert!(text.contains("5000 General Expenses"));
        assert!(text.contains("1000 Cash"));
        assert!(text.contains("$500.00"));
    }

    #[tokio::test]
    async fn shows_message_when_empty() {
        let response = get_journal_page(State(get_state())).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing has been posted to the ledger yet."));
    }
}
