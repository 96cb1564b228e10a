use std::{fmt, sync::Arc};

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
	api_client::ApiClient, cars::envelope, error::ApiError, lenient, notify::Notifier, users::users,
};

pub const MAX_PASSENGERS: u32 = 7;
pub const BOOKINGS_PER_PAGE: usize = 3;

/// Booking form fields as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
	pub pickup_location: String,
	pub drop_location: String,
	pub start_date: String,
	pub passengers: u32,
	pub phone: String,
	pub note: Option<String>,
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct BookingRequest {
	pub car_id: u64,
	pub pickup_location: String,
	pub drop_location: String,
	pub start_date: NaiveDate,
	pub passengers: u32,
	pub phone: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
}

impl BookingForm {
	pub fn into_request(self, car_id: u64) -> Result<BookingRequest, ApiError> {
		let required = [
			("Pickup location", &self.pickup_location),
			("Drop-off location", &self.drop_location),
			("Start date", &self.start_date),
			("Phone number", &self.phone),
		];
		if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
			return Err(ApiError::InvalidBooking(format!("{} is required", field)));
		}
		if !(1..=MAX_PASSENGERS).contains(&self.passengers) {
			let message = format!("Passengers must be between 1 and {}", MAX_PASSENGERS);
			return Err(ApiError::InvalidBooking(message));
		}
		let start_date = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").map_err(|_| {
			let message = format!("Start date {:?} is not a valid YYYY-MM-DD date", self.start_date);
			ApiError::InvalidBooking(message)
		})?;

		Ok(BookingRequest {
			car_id,
			pickup_location: self.pickup_location.trim().to_owned(),
			drop_location: self.drop_location.trim().to_owned(),
			start_date,
			passengers: self.passengers,
			phone: self.phone.trim().to_owned(),
			note: self.note.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()),
		})
	}
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
	Pending,
	Confirmed,
	Completed,
	Cancelled,
	#[default]
	#[serde(other)]
	Unknown,
}

impl fmt::Display for BookingStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			BookingStatus::Pending => "Pending",
			BookingStatus::Confirmed => "Confirmed",
			BookingStatus::Completed => "Completed",
			BookingStatus::Cancelled => "Cancelled",
			BookingStatus::Unknown => "Unknown",
		};
		f.write_str(label)
	}
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
pub struct BookedCar {
	#[serde(default, deserialize_with = "lenient::id")]
	pub id: u64,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub model: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub daily_rate: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub image_url: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub category: Option<String>,
}

/// Any JSON object decodes; fields of the wrong type fall back to their defaults.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Booking {
	#[serde(default, deserialize_with = "lenient::id")]
	pub id: u64,
	#[serde(default, deserialize_with = "lenient::id")]
	pub car_id: u64,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub start_date: Option<String>,
	#[serde(default, deserialize_with = "lenient::string")]
	pub pickup_location: String,
	#[serde(default, deserialize_with = "lenient::string")]
	pub drop_location: String,
	#[serde(default, deserialize_with = "lenient::opt_u32")]
	pub passengers: Option<u32>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub note: Option<String>,
	#[serde(default, deserialize_with = "status_or_unknown")]
	pub status: BookingStatus,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub total_price: Option<String>,
	#[serde(default, deserialize_with = "lenient::or_none")]
	pub car: Option<BookedCar>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub created_at: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub updated_at: Option<String>,
}

impl Booking {
	pub fn car_model(&self) -> &str {
		self.car.as_ref().and_then(|c| c.model.as_deref()).unwrap_or("Model Unknown")
	}
}

fn status_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BookingStatus, D::Error> {
	let status = Option::<Value>::deserialize(deserializer)?;
	Ok(status
		.and_then(|s| s.as_str().map(str::to_lowercase))
		.and_then(|s| serde_json::from_value(Value::String(s)).ok())
		.unwrap_or_default())
}

/// One page of bookings, numbered from 1.
#[derive(Debug, PartialEq)]
pub struct Page<'a> {
	pub items: &'a [Booking],
	pub number: usize,
	pub total_pages: usize,
}

pub fn paginate(bookings: &[Booking], page: usize) -> Page<'_> {
	let total_pages = bookings.len().div_ceil(BOOKINGS_PER_PAGE);
	let number = page.clamp(1, total_pages.max(1));
	let start = ((number - 1) * BOOKINGS_PER_PAGE).min(bookings.len());
	let end = (start + BOOKINGS_PER_PAGE).min(bookings.len());
	Page { items: &bookings[start..end], number, total_pages }
}

pub struct BookingService {
	api: ApiClient,
	notifier: Arc<dyn Notifier>,
}

impl BookingService {
	pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
		BookingService { api, notifier }
	}

	/// Sends one booking. Nothing leaves the client without a stored session;
	/// an expired session is cleared so the caller can prompt for login again.
	pub async fn submit(&self, car_id: u64, form: BookingForm) -> Result<Value, ApiError> {
		if !self.api.session().is_authenticated() {
			self.notifier.error("Please sign in to book a car");
			return Err(ApiError::NotSignedIn);
		}
		let request = match form.into_request(car_id) {
			Ok(request) => request,
			Err(e) => {
				self.notifier.error(&e.user_message("Please check the booking details"));
				return Err(e);
			}
		};

		match self.api.post_json("/bookings", &request).await {
			Ok(body) => {
				info!("booked car {} for {}", car_id, request.start_date);
				self.notifier.success("Booking created successfully!");
				Ok(body)
			}
			Err(e) if e.is_unauthenticated() => {
				self.expire_session();
				Err(e)
			}
			Err(e) => {
				self.notifier.error(&e.user_message("Booking failed. Please try again."));
				Err(e)
			}
		}
	}

	pub async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
		if !self.api.session().is_authenticated() {
			return Err(ApiError::NotSignedIn);
		}
		let result = self.api.get_json("/bookings").await.and_then(|body| envelope::normalize_lenient(&body));
		match result {
			Ok(records) => Ok(records.into_iter().filter_map(decode_booking).collect()),
			Err(e) => {
				if e.is_unauthenticated() {
					self.expire_session();
				} else {
					self.notifier.error("Failed to fetch bookings");
				}
				Err(e)
			}
		}
	}

	fn expire_session(&self) {
		users::expire_session(self.api.session(), self.notifier.as_ref());
	}
}

fn decode_booking(raw: Value) -> Option<Booking> {
	match serde_json::from_value(raw) {
		Ok(booking) => Some(booking),
		Err(e) => {
			warn!("skipping unreadable booking: {}", e);
			None
		}
	}
}
