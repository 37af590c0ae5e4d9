//! Halls that can be hired by the hour and their bookings.

mod bookings_page;
mod core;
mod handlers;

pub use bookings_page::get_bookings_page;
pub use core::{
    Booking, BookingId, BookingStatus, Hall, HallId, NewBooking, cancel_booking, create_booking,
    create_booking_table, create_hall, create_hall_table, get_all_bookings, get_all_halls,
    get_booking, get_hall,
};
pub use handlers::{cancel_booking_endpoint, create_booking_endpoint, create_hall_endpoint};
