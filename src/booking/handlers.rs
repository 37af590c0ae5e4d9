//! Route handlers for adding halls, booking them and cancelling bookings.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Deserialize;
use time::PrimitiveDateTime;

use crate::{
    Error,
    booking::{
        BookingId, HallId, NewBooking, bookings_page::BookingState, cancel_booking,
        create_booking, create_hall,
    },
    endpoints,
    money::Money,
};

// The value format of `<input type="datetime-local">`.
time::serde::format_description!(
    datetime_local,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]"
);

/// Form data for adding a hall.
#[derive(Debug, Deserialize)]
pub struct HallFormData {
    pub name: String,
    pub hourly_rate: Money,
}

/// Form data for booking a hall.
#[derive(Debug, Deserialize)]
pub struct BookingFormData {
    pub hall_id: HallId,
    pub customer_name: String,
    #[serde(with = "datetime_local")]
    pub start: PrimitiveDateTime,
    #[serde(with = "datetime_local")]
    pub end: PrimitiveDateTime,
}

fn redirect_to_bookings() -> Response {
    (
        HxRedirect(endpoints::BOOKINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for adding a hall.
pub async fn create_hall_endpoint(
    State(state): State<BookingState>,
    Form(form): Form<HallFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_hall(&form.name, form.hourly_rate, &connection) {
        Ok(hall) => {
            tracing::info!("added hall {} \"{}\"", hall.id, hall.name);
            redirect_to_bookings()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for booking a hall.
///
/// Responds with a conflict alert if the hall is already booked during the requested time.
pub async fn create_booking_endpoint(
    State(state): State<BookingState>,
    Form(form): Form<BookingFormData>,
) -> Response {
    let new_booking = NewBooking {
        hall_id: form.hall_id,
        customer_name: form.customer_name,
        start: form.start,
        end: form.end,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_booking(new_booking, &connection) {
        Ok(booking) => {
            tracing::info!(
                "booked hall {} from {} to {} (booking {})",
                booking.hall_id,
                booking.start,
                booking.end,
                booking.id
            );
            redirect_to_bookings()
        }
        Err(Error::BookingConflict) => {
            tracing::debug!(
                "rejected booking for hall {} from {} to {}: time already booked",
                form.hall_id,
                form.start,
                form.end
            );
            Error::BookingConflict.into_alert_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for cancelling a booking.
pub async fn cancel_booking_endpoint(
    State(state): State<BookingState>,
    Path(booking_id): Path<BookingId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match cancel_booking(booking_id, &connection) {
        Ok(()) => {
            tracing::info!("cancelled booking {booking_id}");
            redirect_to_bookings()
        }
        Err(error) => error.into_alert_response(),
    }
}
