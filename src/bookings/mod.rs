pub mod bookings;

pub use bookings::{Booking, BookingForm, BookingRequest, BookingService, BookingStatus};
