pub mod api_client;
pub mod bookings;
pub mod cars;
pub mod config;
pub mod error;
mod lenient;
pub mod newsletter;
pub mod notify;
pub mod users;

pub use api_client::ApiClient;
pub use error::ApiError;
