//! Displays the properties, their leases and the forms for leasing a property.

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
use time::Date;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, base, date_datetime_attr, dollar_input_styles,
        format_currency, form_input, page_header,
    },
    lease::{Lease, LeaseStatus, Property, PropertyId, get_all_leases, get_all_properties},
    ledger::ReferenceType,
    money::Money,
    navigation::NavBar,
    payment::get_payment_totals,
    timezone::get_local_today,
};

/// The state needed for the lease route handlers.
#[derive(Debug, Clone)]
pub struct LeaseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LeaseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

struct LeaseTableRow {
    lease: Lease,
    property_name: String,
    total_rent: Money,
    paid: Money,
}

/// Renders the leases page.
pub async fn get_leases_page(State(state): State<LeaseState>) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let properties = get_all_properties(&connection)?;
    let leases = get_all_leases(&connection)?;
    let paid = get_payment_totals(ReferenceType::Lease, &connection)?;

    let property_names: HashMap<PropertyId, &str> = properties
        .iter()
        .map(|property| (property.id, property.name.as_str()))
        .collect();
    let rows = leases
        .into_iter()
        .map(|lease| {
            Ok(LeaseTableRow {
                property_name: property_names
                    .get(&lease.property_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                total_rent: lease.total_rent()?,
                paid: paid.get(&lease.id).copied().unwrap_or_default(),
                lease,
            })
        })
        .collect::<Result<Vec<LeaseTableRow>, Error>>()?;

    Ok(leases_view(&properties, &rows, today).into_response())
}

fn money_input(name: &str, label: &str, required: bool) -> Markup {
    html!(
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            div class="input-wrapper w-full"
            {
                input
                    id=(name)
                    type="number"
                    name=(name)
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required[required]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    )
}

fn new_property_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_PROPERTY)
            hx-target-error="#alert-container"
            class="grid gap-4 md:grid-cols-3 items-end"
        {
            (form_input("name", "Property name", "text", None))
            (money_input("monthly_rent", "Monthly rent", true))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Property" }
        }
    )
}

fn new_lease_form(properties: &[Property]) -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_LEASE)
            hx-target-error="#alert-container"
            class="grid gap-4 md:grid-cols-2 items-end"
        {
            div
            {
                label for="property_id" class=(FORM_LABEL_STYLE) { "Property" }

                select id="property_id" name="property_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for property in properties {
                        option value=(property.id)
                        {
                            (property.name) " (" (format_currency(property.monthly_rent)) "/month)"
                        }
                    }
                }
            }

            (form_input("tenant_name", "Tenant", "text", None))
            (form_input("start_date", "Start date", "date", None))
            (form_input("end_date", "End date", "date", None))
            (money_input("monthly_rent", "Monthly rent (leave blank for the property's rent)", false))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Lease Property" }
        }
    )
}

fn payment_form(lease_id: i64, today: Date) -> Markup {
    html!(
        form
            hx-post=(format_endpoint(endpoints::POST_LEASE_PAYMENT, lease_id))
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

fn leases_view(properties: &[Property], rows: &[LeaseTableRow], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::LEASES_VIEW).into_html();

    let table_row = |row: &LeaseTableRow| {
        let lease = &row.lease;

        html!(
            tr class=(TABLE_ROW_STYLE) data-lease-id=(lease.id)
            {
                td class=(TABLE_CELL_STYLE) { (row.property_name) }
                td class=(TABLE_CELL_STYLE) { (lease.tenant_name) }
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(date_datetime_attr(lease.start_date)) { (lease.start_date) }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(date_datetime_attr(lease.end_date)) { (lease.end_date) }
                }
                td class="px-6 py-4 text-right" { (lease.term_months()) }
                td class="px-6 py-4 text-right" { (format_currency(lease.monthly_rent)) }
                td class="px-6 py-4 text-right" { (format_currency(row.total_rent)) }
                td class="px-6 py-4 text-right" { (format_currency(row.paid)) }
                td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (lease.status) } }
                td class=(TABLE_CELL_STYLE)
                {
                    @if lease.status == LeaseStatus::Active {
                        div class="flex flex-col gap-2"
                        {
                            (payment_form(lease.id, today))

                            button
                                type="button"
                                hx-post=(format_endpoint(endpoints::TERMINATE_LEASE, lease.id))
                                hx-confirm="Terminate this lease?"
                                hx-target-error="#alert-container"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Terminate"
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
                (page_header("Leases", None))

                @if properties.is_empty() {
                    p { "Add a property before creating leases." }
                } @else {
                    (new_lease_form(properties))
                }

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Property" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Tenant" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Start" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "End" }
                                th scope="col" class="px-6 py-3 text-right" { "Months" }
                                th scope="col" class="px-6 py-3 text-right" { "Rent" }
                                th scope="col" class="px-6 py-3 text-right" { "Total" }
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
                                    td colspan="10" class="px-6 py-4 text-center" { "No leases yet." }
                                }
                            }
                        }
                    }
                }

                h2 class="text-lg font-semibold" { "Properties" }

                (new_property_form())
            }
        }
    );

    base("Leases", &[dollar_input_styles()], &content)
}
