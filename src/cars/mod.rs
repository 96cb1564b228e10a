pub mod cars;
pub mod category;
pub mod envelope;

pub use cars::{Car, CarService};
