//! Halls, hall bookings and their database queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use time::PrimitiveDateTime;

use crate::{
    Error,
    availability::{Interval, is_hall_available},
    database_id::DatabaseId,
    money::Money,
};

/// Database identifier for a hall.
pub type HallId = DatabaseId;

/// Database identifier for a booking.
pub type BookingId = DatabaseId;

/// A hall that can be hired by the hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hall {
    pub id: HallId,
    pub name: String,
    pub hourly_rate: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status \"{other}\"")),
        }
    }
}

impl ToSql for BookingStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BookingStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A reservation of a hall for `[start, end)` in local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: BookingId,
    pub hall_id: HallId,
    pub customer_name: String,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
    pub status: BookingStatus,
}

impl Booking {
    /// The cost of the booking at `hourly_rate`, charged per minute.
    ///
    /// # Errors
    /// Returns [Error::AmountOutOfRange] if the cost is too large to calculate.
    pub fn total_cost(&self, hourly_rate: Money) -> Result<Money, Error> {
        let minutes = Decimal::from((self.end - self.start).whole_minutes());

        hourly_rate
            .as_decimal()
            .checked_mul(minutes)
            .map(|rate_minutes| Money::new(rate_minutes / Decimal::from(60)))
            .ok_or(Error::AmountOutOfRange(hourly_rate.as_decimal()))
    }
}

/// The data needed to book a hall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub hall_id: HallId,
    pub customer_name: String,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

/// Create a hall that can be booked.
///
/// # Errors
/// - [Error::EmptyField] if `name` is empty,
/// - [Error::NonPositiveAmount] if `hourly_rate` is not greater than zero,
/// - [Error::AmountOutOfRange] if `hourly_rate` is too large to store.
pub fn create_hall(name: &str, hourly_rate: Money, connection: &Connection) -> Result<Hall, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyField("Hall name"));
    }

    hourly_rate.validate_positive()?;

    connection.execute(
        "INSERT INTO hall (name, hourly_rate) VALUES (?1, ?2)",
        (name, hourly_rate),
    )?;

    Ok(Hall {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        hourly_rate,
    })
}

pub fn get_hall(hall_id: HallId, connection: &Connection) -> Result<Hall, Error> {
    connection
        .prepare("SELECT id, name, hourly_rate FROM hall WHERE id = :id")?
        .query_row(&[(":id", &hall_id)], map_hall_row)
        .map_err(|error| error.into())
}

/// Retrieve all halls ordered by name.
pub fn get_all_halls(connection: &Connection) -> Result<Vec<Hall>, Error> {
    connection
        .prepare("SELECT id, name, hourly_rate FROM hall ORDER BY name ASC")?
        .query_map([], map_hall_row)?
        .map(|maybe_hall| maybe_hall.map_err(|error| error.into()))
        .collect()
}

/// Book a hall if it is free for the whole requested time.
///
/// The availability check and the insert happen in one transaction.
///
/// # Errors
/// - [Error::EmptyField] if the customer name is empty,
/// - [Error::InvalidInterval] if the booking does not start before it ends,
/// - [Error::BookingConflict] if the hall is already booked during that time,
/// - [Error::InvalidReference] if the hall does not exist.
pub fn create_booking(new_booking: NewBooking, connection: &Connection) -> Result<Booking, Error> {
    let customer_name = new_booking.customer_name.trim();

    if customer_name.is_empty() {
        return Err(Error::EmptyField("Customer name"));
    }

    let interval = Interval::new(new_booking.start, new_booking.end)?;

    let transaction = connection.unchecked_transaction()?;

    if !is_hall_available(new_booking.hall_id, &interval, &transaction)? {
        return Err(Error::BookingConflict);
    }

    transaction.execute(
        "INSERT INTO booking (hall_id, customer_name, start_time, end_time, status)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_booking.hall_id,
            customer_name,
            interval.start(),
            interval.end(),
            BookingStatus::Confirmed,
        ),
    )?;

    let id = transaction.last_insert_rowid();

    transaction.commit()?;

    Ok(Booking {
        id,
        hall_id: new_booking.hall_id,
        customer_name: customer_name.to_owned(),
        start: interval.start(),
        end: interval.end(),
        status: BookingStatus::Confirmed,
    })
}

const SELECT_BOOKING_COLUMNS: &str =
    "SELECT id, hall_id, customer_name, start_time, end_time, status FROM booking";

pub fn get_booking(booking_id: BookingId, connection: &Connection) -> Result<Booking, Error> {
    connection
        .prepare(&format!("{SELECT_BOOKING_COLUMNS} WHERE id = :id"))?
        .query_row(&[(":id", &booking_id)], map_booking_row)
        .map_err(|error| error.into())
}

/// Retrieve all bookings, the latest start time first.
pub fn get_all_bookings(connection: &Connection) -> Result<Vec<Booking>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BOOKING_COLUMNS} ORDER BY start_time DESC, id DESC"
        ))?
        .query_map([], map_booking_row)?
        .map(|maybe_booking| maybe_booking.map_err(|error| error.into()))
        .collect()
}

/// Cancel a booking, freeing its time slot.
///
/// # Errors
/// - [Error::NotFound] if the booking does not exist,
/// - [Error::BookingCancelled] if the booking was already cancelled.
pub fn cancel_booking(booking_id: BookingId, connection: &Connection) -> Result<(), Error> {
    let booking = get_booking(booking_id, connection)?;

    if booking.status == BookingStatus::Cancelled {
        return Err(Error::BookingCancelled);
    }

    connection.execute(
        "UPDATE booking SET status = ?1 WHERE id = ?2",
        (BookingStatus::Cancelled, booking_id),
    )?;

    Ok(())
}

/// Initialize the hall table.
pub fn create_hall_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS hall (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            hourly_rate INTEGER NOT NULL
        );",
    )?;

    Ok(())
}

/// Initialize the booking table and indexes.
pub fn create_booking_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS booking (
            id INTEGER PRIMARY KEY,
            hall_id INTEGER NOT NULL,
            customer_name TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            status TEXT NOT NULL,
            FOREIGN KEY(hall_id) REFERENCES hall(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_booking_hall_time ON booking(hall_id, start_time);",
    )?;

    Ok(())
}

fn map_hall_row(row: &Row) -> Result<Hall, rusqlite::Error> {
    Ok(Hall {
        id: row.get(0)?,
        name: row.get(1)?,
        hourly_rate: row.get(2)?,
    })
}

fn map_booking_row(row: &Row) -> Result<Booking, rusqlite::Error> {
    Ok(Booking {
        id: row.get(0)?,
        hall_id: row.get(1)?,
        customer_name: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
        status: row.get(5)?,
    })
}
