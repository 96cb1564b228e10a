use chrono::{Datelike, Local};
use log::{debug, info};
use serde_json::Value;

use super::{category, envelope};
use crate::{api_client::ApiClient, config, error::ApiError};

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x300?text=No+Image";

/// A car as the screens show it. Built only through [`Car::from_raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct Car {
	pub id: u64,
	pub model: String,
	pub year: i32,
	pub daily_rate: String,
	pub image_url: String,
	/// 1 available, 0 not.
	pub available: i64,
	pub category: String,
	pub seats: u32,
	pub doors: u32,
	pub fuel_type: String,
	pub transmission: String,
	pub description: String,
	/// 1 available, 0 booked.
	pub status: i64,
}

impl Car {
	/// Maps one raw API record, defaulting every field that is missing, null,
	/// blank or of the wrong type. Never fails.
	pub fn from_raw(car: &Value) -> Self {
		Car {
			id: first_of(car, &["id", "_id"], integer).and_then(|id| u64::try_from(id).ok()).unwrap_or(0),
			model: text(car, "model").unwrap_or_else(|| "Unknown Model".to_owned()),
			year: integer(car, "year")
				.and_then(|y| i32::try_from(y).ok())
				.unwrap_or_else(|| Local::now().year()),
			daily_rate: first_of(car, &["daily_rate", "price"], text).unwrap_or_else(|| "0".to_owned()),
			image_url: first_of(car, &["image_url", "image"], text).unwrap_or_default(),
			available: flag(car, "available").unwrap_or(1),
			category: text(car, "category").unwrap_or_else(|| "Unknown".to_owned()),
			seats: integer(car, "seats").and_then(|n| u32::try_from(n).ok()).unwrap_or(4),
			doors: integer(car, "doors").and_then(|n| u32::try_from(n).ok()).unwrap_or(4),
			fuel_type: text(car, "fuel_type").unwrap_or_else(|| "Gasoline".to_owned()),
			transmission: text(car, "transmission").unwrap_or_else(|| "Manual".to_owned()),
			description: text(car, "description").unwrap_or_default(),
			status: flag(car, "status").unwrap_or(1),
		}
	}

	pub fn is_available(&self) -> bool {
		self.status == 1
	}
}

fn first_of<T>(car: &Value, keys: &[&str], read: fn(&Value, &str) -> Option<T>) -> Option<T> {
	keys.iter().find_map(|key| read(car, key))
}

fn text(car: &Value, key: &str) -> Option<String> {
	match car.get(key)? {
		Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn integer(car: &Value, key: &str) -> Option<i64> {
	match car.get(key)? {
		Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// 0/1 flags that some endpoints send as booleans.
fn flag(car: &Value, key: &str) -> Option<i64> {
	match car.get(key)? {
		Value::Bool(b) => Some(i64::from(*b)),
		_ => integer(car, key),
	}
}

/// Resolves an image reference against the API host.
pub fn image_url(api_url: &str, raw: &str) -> String {
	if raw.is_empty() {
		return PLACEHOLDER_IMAGE.to_owned();
	}
	if raw.starts_with("http://") || raw.starts_with("https://") {
		return raw.to_owned();
	}
	let resolved = format!("{}/{}", config::asset_base(api_url), raw.trim_start_matches('/'));
	debug!("Converting image path: {} to URL: {}", raw, resolved);
	resolved
}

#[derive(Clone)]
pub struct CarService {
	api: ApiClient,
}

impl CarService {
	pub fn new(api: ApiClient) -> Self {
		CarService { api }
	}

	/// Raw `GET /cars` body.
	pub async fn all_cars(&self) -> Result<Value, ApiError> {
		self.api.get_json("/cars").await
	}

	pub async fn car(&self, id: u64) -> Result<Car, ApiError> {
		let body = self.api.get_json(&format!("/cars/{}", id)).await?;
		let record = single_record(&body)
			.ok_or_else(|| ApiError::MalformedResponse(format!("no car record for id {}", id)))?;
		Ok(Car::from_raw(record))
	}

	/// Cars of one category bucket; filtering runs on the raw labels.
	pub async fn cars_by_category(&self, requested: &str) -> Result<Vec<Car>, ApiError> {
		let body = self.all_cars().await?;
		let records = envelope::normalize(&body)?;
		let total = records.len();
		let matching = category::filter_by_category(records, requested);
		let cars: Vec<Car> = matching.iter().map(Car::from_raw).collect();
		info!("{} of {} cars match category {:?}", cars.len(), total, requested);
		Ok(cars)
	}

	/// Every car, accepting any envelope the lenient normalizer understands.
	pub async fn listing(&self) -> Result<Vec<Car>, ApiError> {
		let body = self.all_cars().await?;
		Ok(envelope::normalize_lenient(&body)?.iter().map(Car::from_raw).collect())
	}

	pub fn image_url(&self, car: &Car) -> String {
		image_url(self.api.base_url(), &car.image_url)
	}
}

/// `{data:{car:{..}}}`, `{data:{..}}` or a bare object.
fn single_record(body: &Value) -> Option<&Value> {
	let data = body.get("data").filter(|d| d.is_object());
	match data {
		Some(data) => Some(data.get("car").filter(|c| c.is_object()).unwrap_or(data)),
		None if body.get("car").is_some_and(Value::is_object) => body.get("car"),
		None => body.as_object().map(|_| body),
	}
}
