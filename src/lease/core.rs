//! Properties, leases and lease date arithmetic.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    Error,
    availability::{Interval, is_property_available},
    database_id::DatabaseId,
    money::Money,
};

pub type PropertyId = DatabaseId;

pub type LeaseId = DatabaseId;

/// A property that can be leased by the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    /// The rent new leases use when they do not set their own.
    pub monthly_rent: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaseStatus {
    Active,
    Terminated,
}

impl LeaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaseStatus::Active => "Active",
            LeaseStatus::Terminated => "Terminated",
        }
    }
}

impl Display for LeaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LeaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(LeaseStatus::Active),
            "Terminated" => Ok(LeaseStatus::Terminated),
            other => Err(format!("unknown lease status \"{other}\"")),
        }
    }
}

impl ToSql for LeaseStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for LeaseStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A tenancy of a property for the dates `[start_date, end_date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub id: LeaseId,
    pub property_id: PropertyId,
    pub tenant_name: String,
    pub start_date: Date,
    /// The first day the tenant no longer occupies the property.
    pub end_date: Date,
    pub monthly_rent: Money,
    pub status: LeaseStatus,
}

impl Lease {
    /// The number of months the tenant pays rent for.
    pub fn term_months(&self) -> u32 {
        lease_term_months(self.start_date, self.end_date)
    }

    /// The rent due over the whole lease.
    ///
    /// # Errors
    /// Returns [Error::AmountOutOfRange] if the total is too large to calculate.
    pub fn total_rent(&self) -> Result<Money, Error> {
        self.monthly_rent.checked_mul(Decimal::from(self.term_months()))
    }
}

/// The data needed to lease a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLease {
    pub property_id: PropertyId,
    pub tenant_name: String,
    pub start_date: Date,
    pub end_date: Date,
    /// Defaults to the property's monthly rent.
    pub monthly_rent: Option<Money>,
}

/// Add `months` calendar months to `date`.
///
/// The day is clamped to the end of the month, e.g. 31 January plus one
/// month is 28 or 29 February.
fn add_months(date: Date, months: u32) -> Option<Date> {
    let month_index = i32::from(u8::from(date.month())) - 1 + i32::try_from(months).ok()?;
    let year = date.year() + month_index.div_euclid(12);
    let month = Month::try_from(u8::try_from(month_index.rem_euclid(12) + 1).ok()?).ok()?;

    (1..=date.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
}

/// Count the monthly periods that start in `[start, end)`.
///
/// A period starts on the same day of the month as `start`, so a partial
/// final month counts as a whole month.
pub fn lease_term_months(start: Date, end: Date) -> u32 {
    let mut months = 0;

    while let Some(period_start) = add_months(start, months) {
        if period_start >= end {
            break;
        }

        months += 1;
    }

    months
}

/// Create a property that can be leased.
///
/// # Errors
/// - [Error::EmptyField] if `name` is empty,
/// - [Error::NonPositiveAmount] if `monthly_rent` is not greater than zero,
/// - [Error::AmountOutOfRange] if `monthly_rent` is too large to store.
pub fn create_property(
    name: &str,
    monthly_rent: Money,
    connection: &Connection,
) -> Result<Property, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyField("Property name"));
    }

    monthly_rent.validate_positive()?;

    connection.execute(
        "INSERT INTO property (name, monthly_rent) VALUES (?1, ?2)",
        (name, monthly_rent),
    )?;

    Ok(Property {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        monthly_rent,
    })
}

pub fn get_property(property_id: PropertyId, connection: &Connection) -> Result<Property, Error> {
    connection
        .prepare("SELECT id, name, monthly_rent FROM property WHERE id = :id")?
        .query_row(&[(":id", &property_id)], map_property_row)
        .map_err(|error| error.into())
}

/// Retrieve all properties ordered by name.
pub fn get_all_properties(connection: &Connection) -> Result<Vec<Property>, Error> {
    connection
        .prepare("SELECT id, name, monthly_rent FROM property ORDER BY name ASC")?
        .query_map([], map_property_row)?
        .map(|maybe_property| maybe_property.map_err(|error| error.into()))
        .collect()
}

/// Lease a property if no active lease overlaps the requested dates.
///
/// The availability check and the insert happen in one transaction.
///
/// # Errors
/// - [Error::EmptyField] if the tenant name is empty,
/// - [Error::InvalidInterval] if the lease does not start before it ends,
/// - [Error::NonPositiveAmount] if the monthly rent is not greater than zero,
/// - [Error::AmountOutOfRange] if the monthly rent is too large to store,
/// - [Error::InvalidReference] if the property does not exist,
/// - [Error::LeaseConflict] if the property is already leased during those dates.
pub fn create_lease(new_lease: NewLease, connection: &Connection) -> Result<Lease, Error> {
    let tenant_name = new_lease.tenant_name.trim();

    if tenant_name.is_empty() {
        return Err(Error::EmptyField("Tenant name"));
    }

    let interval = Interval::new(new_lease.start_date, new_lease.end_date)?;

    let transaction = connection.unchecked_transaction()?;

    let property = get_property(new_lease.property_id, &transaction).map_err(|error| match error {
        Error::NotFound => Error::InvalidReference,
        error => error,
    })?;
    let monthly_rent = new_lease
        .monthly_rent
        .unwrap_or(property.monthly_rent)
        .validate_positive()?;

    if !is_property_available(property.id, &interval, &transaction)? {
        return Err(Error::LeaseConflict);
    }

    transaction.execute(
        "INSERT INTO lease (property_id, tenant_name, start_date, end_date, monthly_rent, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            property.id,
            tenant_name,
            interval.start(),
            interval.end(),
            monthly_rent,
            LeaseStatus::Active,
        ),
    )?;

    let id = transaction.last_insert_rowid();

    transaction.commit()?;

    Ok(Lease {
        id,
        property_id: property.id,
        tenant_name: tenant_name.to_owned(),
        start_date: interval.start(),
        end_date: interval.end(),
        monthly_rent,
        status: LeaseStatus::Active,
    })
}

const SELECT_LEASE_COLUMNS: &str = "SELECT id, property_id, tenant_name, start_date, end_date, \
    monthly_rent, status FROM lease";

pub fn get_lease(lease_id: LeaseId, connection: &Connection) -> Result<Lease, Error> {
    connection
        .prepare(&format!("{SELECT_LEASE_COLUMNS} WHERE id = :id"))?
        .query_row(&[(":id", &lease_id)], map_lease_row)
        .map_err(|error| error.into())
}

/// Retrieve all leases, the latest start date first.
pub fn get_all_leases(connection: &Connection) -> Result<Vec<Lease>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_LEASE_COLUMNS} ORDER BY start_date DESC, id DESC"
        ))?
        .query_map([], map_lease_row)?
        .map(|maybe_lease| maybe_lease.map_err(|error| error.into()))
        .collect()
}

/// End an active lease, freeing the property for new leases.
///
/// # Errors
/// - [Error::NotFound] if the lease does not exist,
/// - [Error::LeaseNotActive] if the lease was already terminated.
pub fn terminate_lease(lease_id: LeaseId, connection: &Connection) -> Result<(), Error> {
    let lease = get_lease(lease_id, connection)?;

    if lease.status != LeaseStatus::Active {
        return Err(Error::LeaseNotActive);
    }

    connection.execute(
        "UPDATE lease SET status = ?1 WHERE id = ?2",
        (LeaseStatus::Terminated, lease_id),
    )?;

    Ok(())
}

/// Initialize the property table.
pub fn create_property_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS property (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            monthly_rent INTEGER NOT NULL
        );",
    )?;

    Ok(())
}

/// Initialize the lease table and indexes.
pub fn create_lease_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS lease (
            id INTEGER PRIMARY KEY,
            property_id INTEGER NOT NULL,
            tenant_name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            monthly_rent INTEGER NOT NULL,
            status TEXT NOT NULL,
            FOREIGN KEY(property_id) REFERENCES property(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_lease_property_dates ON lease(property_id, start_date);",
    )?;

    Ok(())
}

fn map_property_row(row: &Row) -> Result<Property, rusqlite::Error> {
    Ok(Property {
        id: row.get(0)?,
        name: row.get(1)?,
        monthly_rent: row.get(2)?,
    })
}

fn map_lease_row(row: &Row) -> Result<Lease, rusqlite::Error> {
    Ok(Lease {
        id: row.get(0)?,
        property_id: row.get(1)?,
        tenant_name: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        monthly_rent: row.get(5)?,
        status: row.get(6)?,
    })
}

#[cfg(test)]
mod lease_term_tests {
    use time::macros::date;

    use super::{add_months, lease_term_months};

    #[test]
    fn whole_months() {
        assert_eq!(lease_term_months(date!(2024 - 01 - 15), date!(2024 - 04 - 15)), 3);
        assert_eq!(lease_term_months(date!(2024 - 01 - 01), date!(2025 - 01 - 01)), 12);
    }

    #[test]
    fn partial_final_month_counts() {
        assert_eq!(lease_term_months(date!(2024 - 01 - 15), date!(2024 - 04 - 16)), 4);
        assert_eq!(lease_term_months(date!(2024 - 01 - 15), date!(2024 - 01 - 16)), 1);
    }

    #[test]
    fn empty_range_has_no_months() {
        assert_eq!(lease_term_months(date!(2024 - 01 - 15), date!(2024 - 01 - 15)), 0);
        assert_eq!(lease_term_months(date!(2024 - 02 - 15), date!(2024 - 01 - 15)), 0);
    }

    #[test]
    fn clamps_to_end_of_month() {
        assert_eq!(add_months(date!(2024 - 01 - 31), 1), Some(date!(2024 - 02 - 29)));
        assert_eq!(add_months(date!(2023 - 01 - 31), 1), Some(date!(2023 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 11 - 30), 3), Some(date!(2025 - 02 - 28)));
        assert_eq!(lease_term_months(date!(2024 - 01 - 31), date!(2024 - 03 - 01)), 2);
    }
}
