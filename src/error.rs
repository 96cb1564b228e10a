use reqwest::StatusCode;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("Malformed response: {0}")]
	MalformedResponse(String),
	#[error("Validation failed: {0}")]
	Validation(String),
	#[error("Unauthenticated: {0}")]
	Unauthenticated(String),
	#[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
	Server { status: StatusCode, message: Option<String> },
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),
	#[error("Not signed in")]
	NotSignedIn,
	#[error("Invalid booking: {0}")]
	InvalidBooking(String),
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	#[error("Session storage error: {0}")]
	Storage(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

impl ApiError {
	/// Builds the error for a non-2xx upstream response from its status and decoded body.
	pub fn from_response(status: StatusCode, body: &Value) -> Self {
		let message = body.get("message").and_then(Value::as_str).map(str::to_owned);
		let first_error = first_field_error(body);

		if status == StatusCode::UNAUTHORIZED {
			return ApiError::Unauthenticated(message.unwrap_or_else(|| "Unauthenticated.".to_owned()));
		}
		// `message` is what users see first, field errors only when it is missing
		match (message, first_error) {
			(Some(message), Some(_)) => ApiError::Validation(message),
			(None, Some(field_error)) => ApiError::Validation(field_error),
			(message, None) => ApiError::Server { status, message },
		}
	}

	/// The text a user should see: whatever the server said, otherwise `fallback`.
	pub fn user_message(&self, fallback: &str) -> String {
		match self {
			ApiError::Validation(m)
			| ApiError::Unauthenticated(m)
			| ApiError::InvalidBooking(m)
			| ApiError::InvalidInput(m) => m.clone(),
			ApiError::Server { message: Some(m), .. } => m.clone(),
			_ => fallback.to_owned(),
		}
	}

	pub fn is_unauthenticated(&self) -> bool {
		matches!(self, ApiError::Unauthenticated(_))
	}
}

/// First value of the first key of an `{ "errors": { field: [..] } }` envelope.
fn first_field_error(body: &Value) -> Option<String> {
	let errors = body.get("errors")?.as_object()?;
	let (_, first) = errors.iter().next()?;
	match first {
		Value::Array(values) => values.first().map(|v| match v {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		}),
		Value::String(s) => Some(s.clone()),
		other => Some(other.to_string()),
	}
}
