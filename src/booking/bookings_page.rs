//! Displays the halls, their bookings and the forms for booking a hall.

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
use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    AppState, Error,
    booking::{Booking, BookingStatus, Hall, HallId, get_all_bookings, get_all_halls},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, base, date_datetime_attr, dollar_input_styles,
        format_currency, form_input, page_header,
    },
    ledger::ReferenceType,
    money::Money,
    navigation::NavBar,
    payment::get_payment_totals,
    timezone::get_local_today,
};

/// The state needed for the booking route handlers.
#[derive(Debug, Clone)]
pub struct BookingState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BookingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

const BOOKING_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn format_booking_time(datetime: PrimitiveDateTime) -> String {
    datetime
        .format(BOOKING_TIME_FORMAT)
        .unwrap_or_else(|_| datetime.to_string())
}

struct BookingTableRow {
    booking: Booking,
    hall_name: String,
    cost: Money,
    paid: Money,
}

/// Renders the bookings page.
pub async fn get_bookings_page(State(state): State<BookingState>) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let halls = get_all_halls(&connection)?;
    let bookings = get_all_bookings(&connection)?;
    let paid = get_payment_totals(ReferenceType::Booking, &connection)?;

    let halls_by_id: HashMap<HallId, &Hall> = halls.iter().map(|hall| (hall.id, hall)).collect();
    let rows = bookings
        .into_iter()
        .map(|booking| {
            let hall = halls_by_id.get(&booking.hall_id);
            let cost = match hall {
                Some(hall) => booking.total_cost(hall.hourly_rate)?,
                None => Money::ZERO,
            };

            Ok(BookingTableRow {
                hall_name: hall.map(|hall| hall.name.clone()).unwrap_or_default(),
                cost,
                paid: paid.get(&booking.id).copied().unwrap_or_default(),
                booking,
            })
        })
        .collect::<Result<Vec<BookingTableRow>, Error>>()?;

    Ok(bookings_view(&halls, &rows, today).into_response())
}

fn new_hall_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_HALL)
            hx-target-error="#alert-container"
            class="grid gap-4 md:grid-cols-3 items-end"
        {
            (form_input("name", "Hall name", "text", None))

            div
            {
                label for="hourly_rate" class=(FORM_LABEL_STYLE) { "Hourly rate" }

                div class="input-wrapper w-full"
                {
                    input
                        id="hourly_rate"
                        type="number"
                        name="hourly_rate"
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Hall" }
        }
    )
}

fn new_booking_form(halls: &[Hall]) -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_BOOKING)
            hx-target-error="#alert-container"
            class="grid gap-4 md:grid-cols-2 items-end"
        {
            div
            {
                label for="hall_id" class=(FORM_LABEL_STYLE) { "Hall" }

                select id="hall_id" name="hall_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for hall in halls {
                        option value=(hall.id) { (hall.name) " (" (format_currency(hall.hourly_rate)) "/hr)" }
                    }
                }
            }

            (form_input("customer_name", "Customer", "text", None))
            (form_input("start", "Start", "datetime-local", None))
            (form_input("end", "End", "datetime-local", None))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Book Hall" }
        }
    )
}

fn payment_form(booking_id: i64, today: Date) -> Markup {
    html!(
        form
            hx-post=(format_endpoint(endpoints::POST_BOOKING_PAYMENT, booking_id))
            hx-target-error="#alert-container"
            class="flex gap-2 items-center"
            data-payment-form="true"
        {
            div class="input-wrapper"
            {
                input
                    type="number"
                    name="amount"
                    aria-label="Amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            input
                type="date"
                name="date"
                aria-label="Date"
                required
                value=(date_datetime_attr(today))
                max=(date_datetime_attr(today))
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class="text-blue-600 hover:text-blue-500 underline" { "Record" }
        }
    )
}

fn bookings_view(halls: &[Hall], rows: &[BookingTableRow], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::BOOKINGS_VIEW).into_html();

    let table_row = |row: &BookingTableRow| {
        let booking = &row.booking;
        let is_confirmed = booking.status == BookingStatus::Confirmed;

        html!(
            tr class=(TABLE_ROW_STYLE) data-booking-id=(booking.id)
            {
                td class=(TABLE_CELL_STYLE) { (row.hall_name) }
                td class=(TABLE_CELL_STYLE) { (booking.customer_name) }
                td class=(TABLE_CELL_STYLE) { (format_booking_time(booking.start)) }
                td class=(TABLE_CELL_STYLE) { (format_booking_time(booking.end)) }
                td class="px-6 py-4 text-right" { (format_currency(row.cost)) }
                td class="px-6 py-4 text-right" { (format_currency(row.paid)) }
                td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (booking.status) } }
                td class=(TABLE_CELL_STYLE)
                {
                    @if is_confirmed {
                        div class="flex flex-col gap-2"
                        {
                            (payment_form(booking.id, today))

                            button
                                type="button"
                                hx-delete=(format_endpoint(endpoints::CANCEL_BOOKING, booking.id))
                                hx-confirm="Cancel this booking?"
                                hx-target-error="#alert-container"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Cancel"
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
            section class="space-y-6 w-full lg:max-w-6xl"
            {
                (page_header("Bookings", None))

                @if halls.is_empty() {
                    p { "Add a hall before taking bookings." }
                } @else {
                    (new_booking_form(halls))
                }

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Hall" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Customer" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Start" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "End" }
                                th scope="col" class="px-6 py-3 text-right" { "Cost" }
                                th scope="col" class="px-6 py-3 text-right" { "Paid" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td colspan="8" class="px-6 py-4 text-center" { "No bookings yet." }
                                }
                            }
                        }
                    }
                }

                h2 class="text-lg font-semibold" { "Halls" }

                (new_hall_form())
            }
        }
    );

    base("Bookings", &[dollar_input_styles()], &content)
}

#[cfg(test)]
mod bookings_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        booking::{NewBooking, cancel_booking, create_booking, create_hall},
        endpoints::{self, format_endpoint},
        money::Money,
        test_utils::{assert_valid_html, open_test_db, parse_html_document},
    };

    use super::{BookingState, get_bookings_page};

    fn get_state() -> BookingState {
        let connection = open_test_db();

        BookingState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn shows_bookings_with_cost() {
        let state = get_state();
        let (confirmed_id, cancelled_id) = {
            let connection = state.db_connection.lock().unwrap();
            let hall = create_hall("Hall 1", Money::new(dec!(80)), &connection).unwrap();
            let book = |start, end| {
                create_booking(
                    NewBooking {
                        hall_id: hall.id,
                        customer_name: "Jane Doe".to_owned(),
                        start,
                        end,
                    },
                    &connection,
                )
                .unwrap()
                .id
            };
            let confirmed = book(datetime!(2024-01-10 14:00), datetime!(2024-01-10 16:00));
            let cancelled = book(datetime!(2024-01-11 09:00), datetime!(2024-01-11 10:00));
            cancel_booking(cancelled, &connection).unwrap();
            (confirmed, cancelled)
        };

        let response = get_bookings_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let row_selector =
            Selector::parse(&format!("tr[data-booking-id=\"{confirmed_id}\"]")).unwrap();
        let row = html.select(&row_selector).next().unwrap();
        let text = row.text().collect::<String>();
        assert!(text.contains("2024-01-10 14:00"));
        assert!(text.contains("$160.00"));
        assert!(text.contains("Confirmed"));
        let payment_form = row
            .select(&Selector::parse("form[data-payment-form]").unwrap())
            .next()
            .unwrap();
        assert_eq!(
            payment_form.value().attr("hx-post"),
            Some(format_endpoint(endpoints::POST_BOOKING_PAYMENT, confirmed_id).as_str())
        );

        let cancelled_selector =
            Selector::parse(&format!("tr[data-booking-id=\"{cancelled_id}\"] form")).unwrap();
        assert_eq!(html.select(&cancelled_selector).count(), 0);
    }

    #[tokio::test]
    async fn booking_form_lists_halls() {
        let state = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_hall("Hall 1", Money::new(dec!(80)), &connection).unwrap();
            create_hall("Hall 2", Money::new(dec!(60)), &connection).unwrap();
        }

        let response = get_bookings_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        let form_selector =
            Selector::parse(&format!("form[hx-post=\"{}\"]", endpoints::POST_BOOKING)).unwrap();
        let form = html.select(&form_selector).next().unwrap();
        assert_eq!(
            form.select(&Selector::parse("select[name=hall_id] option").unwrap())
                .count(),
            2
        );
        for name in ["start", "end"] {
            let input = form
                .select(&Selector::parse(&format!("input[name={name}]")).unwrap())
                .next()
                .unwrap();
            assert_eq!(input.value().attr("type"), Some("datetime-local"));
        }
    }

    #[tokio::test]
    async fn without_halls_only_hall_form_is_shown() {
        let response = get_bookings_page(State(get_state())).await.unwrap();

        let html = parse_html_document(response).await;
        let booking_form =
            Selector::parse(&format!("form[hx-post=\"{}\"]", endpoints::POST_BOOKING)).unwrap();
        let hall_form =
            Selector::parse(&format!("form[hx-post=\"{}\"]", endpoints::POST_HALL)).unwrap();
        assert_eq!(html.select(&booking_form).count(), 0);
        assert_eq!(html.select(&hall_form).count(), 1);
    }
}
