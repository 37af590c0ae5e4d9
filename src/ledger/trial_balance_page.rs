//! Displays the trial balance report.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        base, date_datetime_attr, format_currency, page_header,
    },
    ledger::{TrialBalance, get_trial_balance, journal_page::LedgerState},
    navigation::NavBar,
    timezone::get_local_today,
};

#[derive(Debug, Default, Deserialize)]
pub struct TrialBalanceQuery {
    /// Include entries dated on or before this date, defaults to today.
    pub as_of: Option<Date>,
}

/// Renders the trial balance as of the requested date.
pub async fn get_trial_balance_page(
    State(state): State<LedgerState>,
    Query(query): Query<TrialBalanceQuery>,
) -> Result<Response, Error> {
    let as_of = match query.as_of {
        Some(as_of) => as_of,
        None => get_local_today(&state.local_timezone)?,
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let trial_balance = get_trial_balance(as_of, &connection)?;

    if !trial_balance.is_balanced() {
        tracing::warn!(
            "trial balance as of {as_of} does not balance: debits {} != credits {}",
            trial_balance.total_debits,
            trial_balance.total_credits
        );
    }

    Ok(trial_balance_view(&trial_balance).into_response())
}

fn trial_balance_view(trial_balance: &TrialBalance) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRIAL_BALANCE_VIEW).into_html();
    let status = if trial_balance.is_balanced() {
        "Balanced"
    } else {
        "Out of balance"
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Trial Balance", None))

                form method="get" action=(endpoints::TRIAL_BALANCE_VIEW) class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="as_of" class=(FORM_LABEL_STYLE) { "As of" }
                        input
                            id="as_of"
                            type="date"
                            name="as_of"
                            required
                            value=(date_datetime_attr(trial_balance.as_of))
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class="px-6 py-3 text-right" { "Debit" }
                                th scope="col" class="px-6 py-3 text-right" { "Credit" }
                            }
                        }

                        tbody
                        {
                            @for row in &trial_balance.rows {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (row.code) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, row.account_id))
                                            class=(LINK_STYLE)
                                        {
                                            (row.name)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (row.account_type) }
                                    td class="px-6 py-4 text-right"
                                    {
                                        @if row.debit_balance().is_positive() { (format_currency(row.debit_balance())) }
                                    }
                                    td class="px-6 py-4 text-right"
                                    {
                                        @if row.credit_balance().is_positive() { (format_currency(row.credit_balance())) }
                                    }
                                }
                            }
                        }

                        tfoot
                        {
                            tr class="font-semibold text-gray-900 dark:text-white"
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) colspan="3" { "Total (" (status) ")" }
                                td class="px-6 py-4 text-right" id="total-debits"
                                {
                                    (format_currency(trial_balance.total_debits))
                                }
                                td class="px-6 py-4 text-right" id="total-credits"
                                {
                                    (format_currency(trial_balance.total_credits))
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Trial Balance", &[], &content)
}

#[cfg(test)]
mod trial_balance_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        account::get_account_by_code,
        ledger::{NewJournalEntry, NewJournalLine, journal_page::LedgerState, post_journal_entry},
        money::Money,
        test_utils::{assert_valid_html, open_test_db, parse_html_document},
    };

    use super::{TrialBalanceQuery, get_trial_balance_page};

    #[tokio::test]
    async fn shows_matching_totals() {
        let connection = open_test_db();
        let cash_id = get_account_by_code("1000", &connection).unwrap().id;
        let equity_id = get_account_by_code("3000", &connection).unwrap().id;
        let amount = Money::new(dec!(1234.5));
        post_journal_entry(
            NewJournalEntry {
                date: date!(2024 - 01 - 01),
                description: "Capital contribution".to_owned(),
                lines: vec![
                    NewJournalLine::debit(cash_id, amount, ""),
                    NewJournalLine::credit(equity_id, amount, ""),
                ],
                reference_type: None,
                reference_id: None,
                source: "test".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let state = LedgerState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let query = TrialBalanceQuery {
            as_of: Some(date!(2024 - 12 - 31)),
        };

        let response = get_trial_balance_page(State(state), Query(query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let total = |id: &str| {
            html.select(&Selector::parse(&format!("#{id}")).unwrap())
                .next()
                .unwrap()
                .text()
                .collect::<String>()
                .trim()
                .to_owned()
        };
        assert_eq!(total("total-debits"), "$1,234.50");
        assert_eq!(total("total-credits"), "$1,234.50");
        let footer = html
            .select(&Selector::parse("tfoot").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(footer.contains("Balanced"));
    }
}
