//! Checks whether halls and properties are free for a requested period.
//!
//! Periods are half-open: a booking that ends at 16:00 does not conflict with
//! one that starts at 16:00.

use rusqlite::Connection;
use time::{Date, PrimitiveDateTime};

use crate::{Error, database_id::DatabaseId};

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval<T> {
    start: T,
    end: T,
}

impl<T: Ord + Copy> Interval<T> {
    /// Create the interval `[start, end)`.
    ///
    /// # Errors
    /// Returns [Error::InvalidInterval] if `start` is not before `end`.
    pub fn new(start: T, end: T) -> Result<Self, Error> {
        if start >= end {
            return Err(Error::InvalidInterval);
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    /// Whether the two intervals share any point in time.
    pub fn overlaps(&self, other: &Interval<T>) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Whether the hall has no confirmed booking that overlaps `interval`.
pub fn is_hall_available(
    hall_id: DatabaseId,
    interval: &Interval<PrimitiveDateTime>,
    connection: &Connection,
) -> Result<bool, Error> {
    let conflicts: i64 = connection
        .prepare(
            "SELECT COUNT(*) FROM booking
            WHERE hall_id = :hall_id
                AND status != 'Cancelled'
                AND start_time < :end
                AND end_time > :start",
        )?
        .query_row(
            rusqlite::named_params! {
                ":hall_id": hall_id,
                ":start": interval.start(),
                ":end": interval.end(),
            },
            |row| row.get(0),
        )?;

    Ok(conflicts == 0)
}

/// Whether the property has no active lease that overlaps `interval`.
pub fn is_property_available(
    property_id: DatabaseId,
    interval: &Interval<Date>,
    connection: &Connection,
) -> Result<bool, Error> {
    let conflicts: i64 = connection
        .prepare(
            "SELECT COUNT(*) FROM lease
            WHERE property_id = :property_id
                AND status = 'Active'
                AND start_date < :end
                AND end_date > :start",
        )?
        .query_row(
            rusqlite::named_params! {
                ":property_id": property_id,
                ":start": interval.start(),
                ":end": interval.end(),
            },
            |row| row.get(0),
        )?;

    Ok(conflicts == 0)
}

#[cfg(test)]
mod interval_tests {
    use proptest::prelude::*;
    use time::macros::datetime;

    use crate::Error;

    use super::Interval;

    #[test]
    fn rejects_empty_and_reversed_intervals() {
        assert_eq!(Interval::new(5, 5), Err(Error::InvalidInterval));
        assert_eq!(Interval::new(6, 5), Err(Error::InvalidInterval));
    }

    #[test]
    fn partial_overlap_conflicts() {
        let booked = Interval::new(datetime!(2024-01-10 14:00), datetime!(2024-01-10 16:00)).unwrap();
        let requested =
            Interval::new(datetime!(2024-01-10 15:00), datetime!(2024-01-10 17:00)).unwrap();

        assert!(booked.overlaps(&requested));
        assert!(requested.overlaps(&booked));
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        let booked = Interval::new(datetime!(2024-01-10 14:00), datetime!(2024-01-10 16:00)).unwrap();
        let requested =
            Interval::new(datetime!(2024-01-10 16:00), datetime!(2024-01-10 18:00)).unwrap();

        assert!(!booked.overlaps(&requested));
        assert!(!requested.overlaps(&booked));
    }

    #[test]
    fn containing_interval_conflicts() {
        let outer = Interval::new(1, 10).unwrap();
        let inner = Interval::new(3, 4).unwrap();

        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    proptest! {
        #[test]
        fn overlap_matches_shared_points(
            a_start in 0i32..50, a_len in 1i32..20,
            b_start in 0i32..50, b_len in 1i32..20,
        ) {
            let a = Interval::new(a_start, a_start + a_len).unwrap();
            let b = Interval::new(b_start, b_start + b_len).unwrap();
            let shares_point = (a_start..a_start + a_len).any(|t| (b_start..b_start + b_len).contains(&t));

            prop_assert_eq!(a.overlaps(&b), shares_point);
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }
}
