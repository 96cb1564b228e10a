//! Decoding of the list envelopes the rental API wraps car records in.
//!
//! Upstream endpoints disagree on shape, so each known schema is tried as a typed
//! parse in a fixed priority order:
//!
//! 1. `{ "success": <truthy>, "data": { "data": [..] } }` (paginated)
//! 2. `{ "data": { "cars": [..] } }`
//! 3. `{ "data": [..] }`
//! 4. `[..]`
//! 5. (lenient only) the longest array-valued property of the object

use log::debug;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

/// `success` flag that only deserializes when truthy.
#[derive(Debug)]
struct Truthy;

impl<'de> Deserialize<'de> for Truthy {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let truthy = match Value::deserialize(deserializer)? {
			Value::Bool(b) => b,
			Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
			Value::String(s) => !s.is_empty(),
			Value::Array(_) | Value::Object(_) => true,
			Value::Null => false,
		};
		if truthy {
			Ok(Truthy)
		} else {
			Err(de::Error::custom("success flag is not set"))
		}
	}
}

#[derive(Debug, Deserialize)]
struct Page {
	data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CarList {
	cars: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
	#[allow(dead_code)]
	Paginated { success: Truthy, data: Page },
	Cars { data: CarList },
	Wrapped { data: Vec<Value> },
	Bare(Vec<Value>),
}

impl Envelope {
	fn into_records(self) -> Vec<Value> {
		match self {
			Envelope::Paginated { data, .. } => data.data,
			Envelope::Cars { data } => data.cars,
			Envelope::Wrapped { data } | Envelope::Bare(data) => data,
		}
	}

	fn kind(&self) -> &'static str {
		match self {
			Envelope::Paginated { .. } => "data.data",
			Envelope::Cars { .. } => "data.cars",
			Envelope::Wrapped { .. } => "data",
			Envelope::Bare(_) => "bare array",
		}
	}
}

fn decode(value: &Value) -> Option<Envelope> {
	let envelope = Envelope::deserialize(value).ok()?;
	debug!("normalized response using {}", envelope.kind());
	Some(envelope)
}

/// Extracts the record array using rules 1-4.
pub fn normalize(value: &Value) -> Result<Vec<Value>, ApiError> {
	decode(value)
		.map(Envelope::into_records)
		.ok_or_else(|| ApiError::MalformedResponse("Invalid data structure received".to_owned()))
}

/// Rules 1-4, then falls back to the longest array among the object's own values.
pub fn normalize_lenient(value: &Value) -> Result<Vec<Value>, ApiError> {
	if let Some(envelope) = decode(value) {
		return Ok(envelope.into_records());
	}
	let longest = value
		.as_object()
		.into_iter()
		.flat_map(|object| object.values())
		.filter_map(Value::as_array)
		.fold(None, |best: Option<&Vec<Value>>, candidate| match best {
			Some(best) if best.len() > candidate.len() => Some(best),
			_ => Some(candidate),
		});
	match longest {
		Some(records) => {
			debug!("normalized response using longest array ({} records)", records.len());
			Ok(records.clone())
		}
		None => Err(ApiError::MalformedResponse("Could not find cars array in data".to_owned())),
	}
}
