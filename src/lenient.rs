//! Field deserializers for records whose types drift between endpoints:
//! ids and counts sent as strings, prices as numbers, `null` where a value is expected.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

fn number(value: &Value) -> Option<u64> {
	match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Numeric or numeric-string id, 0 otherwise.
pub(crate) fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
	let value = Value::deserialize(deserializer)?;
	Ok(number(&value).unwrap_or(0))
}

pub(crate) fn opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	let value = Value::deserialize(deserializer)?;
	Ok(number(&value).and_then(|n| u32::try_from(n).ok()))
}

pub(crate) fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(s) => Some(s),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	})
}

/// Like [`opt_string`], with `null` read as an empty string.
pub(crate) fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Nested record that is dropped, not fatal, when it does not fit `T`.
pub(crate) fn or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let value = Value::deserialize(deserializer)?;
	Ok(serde_json::from_value(value).ok())
}
