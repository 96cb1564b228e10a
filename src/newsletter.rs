use std::sync::Arc;

use log::info;
use serde_json::json;

use crate::{api_client::ApiClient, error::ApiError, notify::Notifier};

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
	let email = email.trim();
	match email.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
		_ => Err(ApiError::InvalidInput("Please enter a valid email address".to_owned())),
	}
}

pub async fn subscribe(api: &ApiClient, notifier: &Arc<dyn Notifier>, email: &str) -> Result<(), ApiError> {
	let result = match validate_email(email) {
		Ok(email) => api.post_json("/newsletter/subscribe", &json!({ "email": email })).await.map(|_| ()),
		Err(e) => Err(e),
	};
	match &result {
		Ok(()) => {
			info!("subscribed {} to the newsletter", email.trim());
			notifier.success("Subscribed successfully");
		}
		Err(e) => notifier.error(&e.user_message("Subscription failed. Please try again.")),
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validate_email() {
		assert_eq!(validate_email(" amina@example.com ").unwrap(), "amina@example.com");
		assert!(validate_email("").is_err());
		assert!(validate_email("amina").is_err());
		assert!(validate_email("@example.com").is_err());
		assert!(validate_email("amina@").is_err());
	}
}
