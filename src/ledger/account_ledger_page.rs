//! Displays the general ledger of one account with opening, running and closing balances.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::AccountId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
        date_datetime_attr, format_currency, page_header,
    },
    ledger::{AccountStatement, DateRange, get_account_statement, journal_page::LedgerState},
    navigation::NavBar,
    timezone::get_local_today,
};

/// The date range to show, defaults to the start of the current month until today.
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

/// Renders the ledger of the account `account_id`.
pub async fn get_account_ledger_page(
    State(state): State<LedgerState>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<LedgerQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let start = query.start.unwrap_or_else(|| today.replace_day(1).unwrap_or(today));
    let end = query.end.unwrap_or(today);
    let range = DateRange::new(start, end)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statement = get_account_statement(account_id, range, &connection)?;

    Ok(account_ledger_view(&statement).into_response())
}

fn account_ledger_view(statement: &AccountStatement) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let account = &statement.account;
    let title = format!("{} {}", account.code, account.name);
    let ledger_url = format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, account.id);
    let normal_side = account.account_type.normal_balance();

    let balance_row = |label: &str, balance| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) colspan="5" { (label) }
                td class="px-6 py-4 text-right font-semibold" { (format_currency(balance)) }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header(&title, Some((endpoints::ACCOUNTS_VIEW, "All Accounts"))))

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    (account.account_type) " account, normal " (normal_side) " balance. "
                    "Balances are shown as debits minus credits."
                }

                form method="get" action=(ledger_url) class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="start" class=(FORM_LABEL_STYLE) { "From" }
                        input
                            id="start"
                            type="date"
                            name="start"
                            required
                            value=(date_datetime_attr(statement.range.start()))
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="end" class=(FORM_LABEL_STYLE) { "To" }
                        input
                            id="end"
                            type="date"
                            name="end"
                            required
                            value=(date_datetime_attr(statement.range.end()))
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div { button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" } }
                }

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Entry" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-3 text-right" { "Debit" }
                                th scope="col" class="px-6 py-3 text-right" { "Credit" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                            }
                        }

                        tbody
                        {
                            (balance_row("Opening balance", statement.opening_balance))

                            @for row in &statement.rows {
                                tr class=(TABLE_ROW_STYLE) data-statement-row="true"
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        time datetime=(date_datetime_attr(row.date)) { (row.date) }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (row.entry_number) }
                                    td class=(TABLE_CELL_STYLE) { (row.description) }
                                    td class="px-6 py-4 text-right"
                                    {
                                        @if row.debit.is_positive() { (format_currency(row.debit)) }
                                    }
                                    td class="px-6 py-4 text-right"
                                    {
                                        @if row.credit.is_positive() { (format_currency(row.credit)) }
                                    }
                                    td class="px-6 py-4 text-right" { (format_currency(row.balance)) }
                                }
                            }

                            (balance_row("Closing balance", statement.closing_balance))
                        }
                    }
                }
            }
        }
    );

    base(&title, &[], &content)
}

#[cfg(test)]
mod account_ledger_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        Error,
        account::get_account_by_code,
        ledger::{NewJournalEntry, NewJournalLine, journal_page::LedgerState, post_journal_entry},
        money::Money,
        test_utils::{assert_valid_html, open_test_db, parse_html_document},
    };

    use super::{LedgerQuery, get_account_ledger_page};

    fn get_state() -> LedgerState {
        let connection = open_test_db();

        LedgerState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn post_receipt(state: &LedgerState, date: time::Date, amount: Money) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        let cash_id = get_account_by_code("1000", &connection).unwrap().id;
        let revenue_id = get_account_by_code("4000", &connection).unwrap().id;

        post_journal_entry(
            NewJournalEntry {
                date,
                description: "Hall hire".to_owned(),
                lines: vec![
                    NewJournalLine::debit(cash_id, amount, ""),
                    NewJournalLine::credit(revenue_id, amount, ""),
                ],
                reference_type: None,
                reference_id: None,
                source: "test".to_owned(),
            },
            &connection,
        )
        .unwrap();

        cash_id
    }

    #[tokio::test]
    async fn shows_statement_rows_in_range() {
        let state = get_state();
        post_receipt(&state, date!(2023 - 12 - 01), Money::new(dec!(100)));
        post_receipt(&state, date!(2024 - 01 - 10), Money::new(dec!(40)));
        let cash_id = post_receipt(&state, date!(2024 - 01 - 11), Money::new(dec!(2.5)));
        let query = LedgerQuery {
            start: Some(date!(2024 - 01 - 01)),
            end: Some(date!(2024 - 01 - 31)),
        };

        let response = get_account_ledger_page(State(state), Path(cash_id), Query(query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let balances: Vec<String> = html
            .select(&Selector::parse("tr[data-statement-row] td:last-child").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect();
        assert_eq!(balances, vec!["$140.00", "$142.50"]);
        let start_input = html
            .select(&Selector::parse("input[name=start]").unwrap())
            .next()
            .unwrap();
        assert_eq!(start_input.value().attr("value"), Some("2024-01-01"));
    }

    #[tokio::test]
    async fn rejects_start_after_end() {
        let query = LedgerQuery {
            start: Some(date!(2024 - 02 - 01)),
            end: Some(date!(2024 - 01 - 01)),
        };

        let result = get_account_ledger_page(State(get_state()), Path(1), Query(query)).await;

        assert_eq!(result.err(), Some(Error::InvalidInterval));
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let result =
            get_account_ledger_page(State(get_state()), Path(999), Query(LedgerQuery::default()))
                .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
