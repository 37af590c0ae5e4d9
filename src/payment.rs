//! Payments received for hall bookings and leases, and the journal entries they post.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    booking::{BookingId, BookingStatus, get_booking, get_hall},
    config::LedgerConfig,
    database_id::DatabaseId,
    endpoints,
    lease::{LeaseId, LeaseStatus, get_lease, get_property},
    ledger::{
        JournalEntryId, NewJournalEntry, NewJournalLine, ReferenceType, insert_journal_entry,
    },
    money::Money,
    timezone::get_local_today,
};

/// The database ID of a payment.
pub type PaymentId = DatabaseId;

/// Money received for a booking or a lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    /// The ID of the payment.
    pub id: PaymentId,
    /// Either [ReferenceType::Booking] or [ReferenceType::Lease].
    pub reference_type: ReferenceType,
    /// The ID of the booking or lease that was paid for.
    pub reference_id: DatabaseId,
    /// The date the money was received.
    pub date: Date,
    /// The amount received.
    pub amount: Money,
    /// The journal entry that records the payment in the ledger.
    pub journal_entry_id: JournalEntryId,
}

fn validate_payment(amount: Money, date: Date, today: Date) -> Result<(), Error> {
    amount.validate_positive()?;

    if date > today {
        return Err(Error::FutureDate(date));
    }

    Ok(())
}

/// Record a payment for a hall booking.
///
/// Posts debit cash and credit hall revenue, and inserts the payment, in one transaction.
///
/// # Errors
/// - [Error::NonPositiveAmount] if `amount` is not greater than zero,
/// - [Error::FutureDate] if `date` is after `today`,
/// - [Error::NotFound] if the booking does not exist,
/// - [Error::BookingCancelled] if the booking has been cancelled,
/// - [Error::MissingDefaultAccount] if a configured account does not exist.
pub fn record_booking_payment(
    booking_id: BookingId,
    amount: Money,
    date: Date,
    today: Date,
    ledger_config: &LedgerConfig,
    connection: &Connection,
) -> Result<Payment, Error> {
    validate_payment(amount, date, today)?;

    let transaction = connection.unchecked_transaction()?;

    let booking = get_booking(booking_id, &transaction)?;

    if booking.status == BookingStatus::Cancelled {
        return Err(Error::BookingCancelled);
    }

    let hall = get_hall(booking.hall_id, &transaction)?;
    let cash_account = ledger_config.cash_account(&transaction)?;
    let revenue_account = ledger_config.hall_revenue_account(&transaction)?;

    let entry = insert_journal_entry(
        NewJournalEntry {
            date,
            description: format!("Payment for {} booked by {}", hall.name, booking.customer_name),
            lines: vec![
                NewJournalLine::debit(cash_account.id, amount, "Booking payment received"),
                NewJournalLine::credit(revenue_account.id, amount, "Hall rental revenue"),
            ],
            reference_type: Some(ReferenceType::Booking),
            reference_id: Some(booking.id),
            source: "booking_payment".to_owned(),
        },
        &transaction,
    )?;

    let payment = insert_payment(
        ReferenceType::Booking,
        booking.id,
        date,
        amount,
        entry.id,
        &transaction,
    )?;

    transaction.commit()?;

    Ok(payment)
}

/// Record a rent payment for a lease.
///
/// Posts debit cash and credit rental income, and inserts the payment, in one transaction.
///
/// # Errors
/// - [Error::NonPositiveAmount] if `amount` is not greater than zero,
/// - [Error::FutureDate] if `date` is after `today`,
/// - [Error::NotFound] if the lease does not exist,
/// - [Error::LeaseNotActive] if the lease has been terminated,
/// - [Error::MissingDefaultAccount] if a configured account does not exist.
pub fn record_rent_payment(
    lease_id: LeaseId,
    amount: Money,
    date: Date,
    today: Date,
    ledger_config: &LedgerConfig,
    connection: &Connection,
) -> Result<Payment, Error> {
    validate_payment(amount, date, today)?;

    let transaction = connection.unchecked_transaction()?;

    let lease = get_lease(lease_id, &transaction)?;

    if lease.status != LeaseStatus::Active {
        return Err(Error::LeaseNotActive);
    }

    let property = get_property(lease.property_id, &transaction)?;
    let cash_account = ledger_config.cash_account(&transaction)?;
    let revenue_account = ledger_config.rent_revenue_account(&transaction)?;

    let entry = insert_journal_entry(
        NewJournalEntry {
            date,
            description: format!("Rent for {} from {}", property.name, lease.tenant_name),
            lines: vec![
                NewJournalLine::debit(cash_account.id, amount, "Rent received"),
                NewJournalLine::credit(revenue_account.id, amount, "Rental income"),
            ],
            reference_type: Some(ReferenceType::Lease),
            reference_id: Some(lease.id),
            source: "rent_payment".to_owned(),
        },
        &transaction,
    )?;

    let payment = insert_payment(
        ReferenceType::Lease,
        lease.id,
        date,
        amount,
        entry.id,
        &transaction,
    )?;

    transaction.commit()?;

    Ok(payment)
}

fn insert_payment(
    reference_type: ReferenceType,
    reference_id: DatabaseId,
    date: Date,
    amount: Money,
    journal_entry_id: JournalEntryId,
    connection: &Connection,
) -> Result<Payment, Error> {
    connection.execute(
        "INSERT INTO payment (reference_type, reference_id, date, amount, journal_entry_id)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (reference_type, reference_id, date, amount, journal_entry_id),
    )?;

    Ok(Payment {
        id: connection.last_insert_rowid(),
        reference_type,
        reference_id,
        date,
        amount,
        journal_entry_id,
    })
}

/// Retrieve the payments for one booking or lease, oldest first.
pub fn get_payments(
    reference_type: ReferenceType,
    reference_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Payment>, Error> {
    connection
        .prepare(
            "SELECT id, reference_type, reference_id, date, amount, journal_entry_id
            FROM payment
            WHERE reference_type = :reference_type AND reference_id = :reference_id
            ORDER BY date ASC, id ASC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":reference_type": reference_type,
                ":reference_id": reference_id,
            },
            map_payment_row,
        )?
        .map(|maybe_payment| maybe_payment.map_err(|error| error.into()))
        .collect()
}

/// The total paid so far for each booking or lease of `reference_type` that has payments.
pub fn get_payment_totals(
    reference_type: ReferenceType,
    connection: &Connection,
) -> Result<HashMap<DatabaseId, Money>, Error> {
    connection
        .prepare(
            "SELECT reference_id, SUM(amount) FROM payment
            WHERE reference_type = :reference_type
            GROUP BY reference_id",
        )?
        .query_map(rusqlite::named_params! { ":reference_type": reference_type }, |row| {
            let total: (DatabaseId, Money) = (row.get(0)?, row.get(1)?);
            Ok(total)
        })?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// Initialize the payment table.
pub fn create_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS payment (
            id INTEGER PRIMARY KEY,
            reference_type TEXT NOT NULL CHECK (reference_type IN ('Booking', 'Lease')),
            reference_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            journal_entry_id INTEGER NOT NULL,
            FOREIGN KEY(journal_entry_id) REFERENCES journal_entry(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_payment_reference ON payment(reference_type, reference_id);",
    )?;

    Ok(())
}

fn map_payment_row(row: &Row) -> Result<Payment, rusqlite::Error> {
    Ok(Payment {
        id: row.get(0)?,
        reference_type: row.get(1)?,
        reference_id: row.get(2)?,
        date: row.get(3)?,
        amount: row.get(4)?,
        journal_entry_id: row.get(5)?,
    })
}

/// The state needed for recording payments.
#[derive(Debug, Clone)]
pub struct PaymentState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub ledger_config: LedgerConfig,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            ledger_config: state.ledger_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Form data for recording a payment.
#[derive(Debug, Deserialize)]
pub struct PaymentFormData {
    pub amount: Money,
    pub date: Date,
}

/// A route handler for recording a payment against a booking.
pub async fn create_booking_payment_endpoint(
    State(state): State<PaymentState>,
    Path(booking_id): Path<BookingId>,
    Form(form): Form<PaymentFormData>,
) -> Response {
    record_payment(&state, endpoints::BOOKINGS_VIEW, |today, connection| {
        record_booking_payment(
            booking_id,
            form.amount,
            form.date,
            today,
            &state.ledger_config,
            connection,
        )
    })
}

/// A route handler for recording a rent payment against a lease.
pub async fn create_lease_payment_endpoint(
    State(state): State<PaymentState>,
    Path(lease_id): Path<LeaseId>,
    Form(form): Form<PaymentFormData>,
) -> Response {
    record_payment(&state, endpoints::LEASES_VIEW, |today, connection| {
        record_rent_payment(
            lease_id,
            form.amount,
            form.date,
            today,
            &state.ledger_config,
            connection,
        )
    })
}

fn record_payment(
    state: &PaymentState,
    redirect_to: &str,
    record: impl FnOnce(Date, &Connection) -> Result<Payment, Error>,
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

    match record(today, &connection) {
        Ok(payment) => {
            tracing::info!(
                "recorded payment of {} for {} {} in journal entry {}",
                payment.amount,
                payment.reference_type,
                payment.reference_id,
                payment.journal_entry_id
            );

            (HxRedirect(redirect_to.to_owned()), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod payment_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        account::get_account_by_code,
        booking::{Booking, NewBooking, cancel_booking, create_booking, create_hall},
        config::LedgerConfig,
        db::initialize,
        lease::{Lease, NewLease, create_lease, create_property, terminate_lease},
        ledger::{ReferenceType, get_balance_as_of, get_journal_entry},
        money::Money,
    };

    use super::{get_payment_totals, get_payments, record_booking_payment, record_rent_payment};

    const TODAY: time::Date = date!(2024 - 02 - 01);

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn book_hall(connection: &Connection) -> Booking {
        let hall = create_hall("Hall 1", Money::new(dec!(80)), connection).unwrap();

        create_booking(
            NewBooking {
                hall_id: hall.id,
                customer_name: "Jane Doe".to_owned(),
                start: datetime!(2024-01-10 14:00),
                end: datetime!(2024-01-10 16:00),
            },
            connection,
        )
        .unwrap()
    }

    fn lease_property(connection: &Connection) -> Lease {
        let property = create_property("Unit 1", Money::new(dec!(1200)), connection).unwrap();

        create_lease(
            NewLease {
                property_id: property.id,
                tenant_name: "John Smith".to_owned(),
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2024 - 07 - 01),
                monthly_rent: None,
            },
            connection,
        )
        .unwrap()
    }

    #[test]
    fn booking_payment_posts_cash_and_hall_revenue() {
        let connection = get_test_connection();
        let booking = book_hall(&connection);
        let amount = Money::new(dec!(160));

        let payment = record_booking_payment(
            booking.id,
            amount,
            date!(2024 - 01 - 10),
            TODAY,
            &LedgerConfig::default(),
            &connection,
        )
        .unwrap();

        let entry = get_journal_entry(payment.journal_entry_id, &connection).unwrap();
        let cash = get_account_by_code("1000", &connection).unwrap();
        let revenue = get_account_by_code("4000", &connection).unwrap();
        assert_eq!(entry.reference_type, Some(ReferenceType::Booking));
        assert_eq!(entry.reference_id, Some(booking.id));
        assert_eq!(entry.source, "booking_payment");
        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.lines[0].account_id, cash.id);
        assert_eq!(entry.lines[0].debit, amount);
        assert_eq!(entry.lines[1].account_id, revenue.id);
        assert_eq!(entry.lines[1].credit, amount);
        assert_eq!(get_balance_as_of(cash.id, TODAY, &connection), Ok(amount));
        assert_eq!(
            get_payments(ReferenceType::Booking, booking.id, &connection),
            Ok(vec![payment])
        );
    }

    #[test]
    fn rent_payment_posts_cash_and_rental_income() {
        let connection = get_test_connection();
        let lease = lease_property(&connection);
        let amount = Money::new(dec!(1200));

        let payment = record_rent_payment(
            lease.id,
            amount,
            date!(2024 - 01 - 01),
            TODAY,
            &LedgerConfig::default(),
            &connection,
        )
        .unwrap();

        let entry = get_journal_entry(payment.journal_entry_id, &connection).unwrap();
        let revenue = get_account_by_code("4100", &connection).unwrap();
        assert_eq!(entry.reference_type, Some(ReferenceType::Lease));
        assert_eq!(entry.lines[1].account_id, revenue.id);
        assert_eq!(
            get_balance_as_of(revenue.id, TODAY, &connection),
            Ok(-amount)
        );
    }

    #[test]
    fn payment_totals_are_grouped_by_reference() {
        let connection = get_test_connection();
        let booking = book_hall(&connection);
        let config = LedgerConfig::default();
        for amount in [dec!(50), dec!(25.5)] {
            record_booking_payment(
                booking.id,
                Money::new(amount),
                date!(2024 - 01 - 10),
                TODAY,
                &config,
                &connection,
            )
            .unwrap();
        }

        let totals = get_payment_totals(ReferenceType::Booking, &connection).unwrap();

        assert_eq!(totals.get(&booking.id), Some(&Money::new(dec!(75.5))));
        assert!(
            get_payment_totals(ReferenceType::Lease, &connection)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn rejects_invalid_amount_and_future_date() {
        let connection = get_test_connection();
        let booking = book_hall(&connection);
        let config = LedgerConfig::default();

        assert_eq!(
            record_booking_payment(
                booking.id,
                Money::ZERO,
                TODAY,
                TODAY,
                &config,
                &connection
            ),
            Err(Error::NonPositiveAmount(Money::ZERO))
        );
        assert_eq!(
            record_booking_payment(
                booking.id,
                Money::new(dec!(10)),
                date!(2024 - 02 - 02),
                TODAY,
                &config,
                &connection
            ),
            Err(Error::FutureDate(date!(2024 - 02 - 02)))
        );
    }

    #[test]
    fn rejects_cancelled_booking_and_terminated_lease() {
        let connection = get_test_connection();
        let booking = book_hall(&connection);
        let lease = lease_property(&connection);
        let config = LedgerConfig::default();
        cancel_booking(booking.id, &connection).unwrap();
        terminate_lease(lease.id, &connection).unwrap();

        assert_eq!(
            record_booking_payment(
                booking.id,
                Money::new(dec!(10)),
                TODAY,
                TODAY,
                &config,
                &connection
            ),
            Err(Error::BookingCancelled)
        );
        assert_eq!(
            record_rent_payment(
                lease.id,
                Money::new(dec!(10)),
                TODAY,
                TODAY,
                &config,
                &connection
            ),
            Err(Error::LeaseNotActive)
        );
    }

    #[test]
    fn missing_revenue_account_rolls_back() {
        let connection = get_test_connection();
        let booking = book_hall(&connection);
        let config = LedgerConfig {
            hall_revenue_account_code: "4999".to_owned(),
            ..Default::default()
        };

        let result = record_booking_payment(
            booking.id,
            Money::new(dec!(10)),
            TODAY,
            TODAY,
            &config,
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::MissingDefaultAccount("4999".to_owned()))
        );
        let entry_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM journal_entry", [], |row| row.get(0))
            .unwrap();
        assert_eq!(entry_count, 0);
        assert_eq!(
            get_payments(ReferenceType::Booking, booking.id, &connection),
            Ok(vec![])
        );
    }
}

#[cfg(test)]
mod payment_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        booking::{NewBooking, create_booking, create_hall},
        config::LedgerConfig,
        db::initialize,
        endpoints,
        ledger::ReferenceType,
        money::Money,
        test_utils::assert_hx_redirect,
    };

    use super::{
        PaymentFormData, PaymentState, create_booking_payment_endpoint,
        create_lease_payment_endpoint, get_payments,
    };

    fn get_state() -> PaymentState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        PaymentState {
            local_timezone: "Etc/UTC".to_owned(),
            ledger_config: LedgerConfig::default(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn records_booking_payment_and_redirects() {
        let state = get_state();
        let booking_id = {
            let connection = state.db_connection.lock().unwrap();
            let hall = create_hall("Hall 1", Money::new(dec!(80)), &connection).unwrap();
            create_booking(
                NewBooking {
                    hall_id: hall.id,
                    customer_name: "Jane Doe".to_owned(),
                    start: datetime!(2024-01-10 14:00),
                    end: datetime!(2024-01-10 16:00),
                },
                &connection,
            )
            .unwrap()
            .id
        };
        let form = PaymentFormData {
            amount: Money::new(dec!(160)),
            date: OffsetDateTime::now_utc().date(),
        };

        let response =
            create_booking_payment_endpoint(State(state.clone()), Path(booking_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::BOOKINGS_VIEW);
        let payments = get_payments(
            ReferenceType::Booking,
            booking_id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn missing_lease_returns_not_found_alert() {
        let form = PaymentFormData {
            amount: Money::new(dec!(100)),
            date: OffsetDateTime::now_utc().date(),
        };

        let response = create_lease_payment_endpoint(State(get_state()), Path(7), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
