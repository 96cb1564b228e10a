use std::sync::Arc;

use log::{info, warn};
use serde_json::{json, Value};

use super::session::Session;
use crate::{api_client::ApiClient, error::ApiError, lenient, notify::Notifier};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
pub struct User {
	#[serde(default, deserialize_with = "lenient::id")]
	pub id: u64,
	#[serde(default, deserialize_with = "lenient::string")]
	pub name: String,
	#[serde(default, deserialize_with = "lenient::string")]
	pub email: String,
	#[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

#[derive(serde::Serialize, Debug)]
pub struct LoginData {
	pub email: String,
	pub password: String,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct RegisterData {
	pub name: String,
	pub email: String,
	pub phone: String,
	pub password: String,
	pub password_confirmation: String,
}

/// Login/register reply. Only `token` is required for a session; a profile
/// that cannot be read is kept as `None`.
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct AuthResponse {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub status: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub token: Option<String>,
	#[serde(default, deserialize_with = "lenient::or_none")]
	pub user: Option<User>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub message: Option<String>,
}

/// Drops the stored session after the server rejected its token.
pub fn expire_session(session: &Session, notifier: &dyn Notifier) {
	if let Err(e) = session.clear() {
		warn!("could not clear expired session: {}", e);
	}
	notifier.error("Your session has expired. Please sign in again.");
}

pub struct AuthService {
	api: ApiClient,
	notifier: Arc<dyn Notifier>,
}

impl AuthService {
	pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
		AuthService { api, notifier }
	}

	fn session(&self) -> &Session {
		self.api.session()
	}

	pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
		let data = LoginData { email: email.to_owned(), password: password.to_owned() };
		let result = self.authenticate("/login", &data).await;
		self.report(result, "Logged in successfully", "Login failed. Please try again.")
	}

	pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse, ApiError> {
		let result = self.authenticate("/register", data).await;
		self.report(result, "Account created successfully", "Registration failed. Please try again.")
	}

	/// Posts credentials and stores the returned token + user.
	async fn authenticate<B>(&self, path: &str, body: &B) -> Result<AuthResponse, ApiError>
	where
		B: serde::Serialize,
	{
		let body = self.api.post_json(path, body).await?;
		let response = AuthResponse::from_body(body);
		let Some(token) = response.token.as_deref().filter(|t| !t.is_empty()) else {
			return Err(ApiError::MalformedResponse("Invalid response from server".to_owned()));
		};
		self.session().save(token, response.user.as_ref())?;
		let who = response.user.as_ref().map(|u| u.email.as_str()).unwrap_or("<unknown user>");
		info!("signed in as {}", who);
		Ok(response)
	}

	fn report(
		&self,
		result: Result<AuthResponse, ApiError>,
		success: &str,
		fallback: &str,
	) -> Result<AuthResponse, ApiError> {
		match &result {
			Ok(_) => self.notifier.success(success),
			Err(e) => self.notifier.error(&e.user_message(fallback)),
		}
		result
	}

	/// Best effort on the server, always clears the local session.
	pub async fn logout(&self) -> Result<(), ApiError> {
		let remote = match self.session().token() {
			Some(_) => self.api.post_json("/logout", &json!({})).await.map(|_| ()),
			None => Ok(()),
		};
		self.session().clear()?;

		match remote {
			Ok(()) => self.notifier.success("Logged out successfully"),
			Err(e) => {
				warn!("Logout error: {}", e);
				self.notifier.error("Error during logout");
			}
		}
		Ok(())
	}

	pub fn is_authenticated(&self) -> bool {
		self.session().is_authenticated()
	}

	pub fn current_user(&self) -> Option<User> {
		self.session().user()
	}

	pub fn token(&self) -> Option<String> {
		self.session().token()
	}

	pub fn expire_session(&self) {
		expire_session(self.session(), self.notifier.as_ref());
	}
}

impl AuthResponse {
	/// Non-object bodies read as an empty reply.
	fn from_body(body: Value) -> Self {
		serde_json::from_value(body).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::notify::RecordingNotifier;

	#[test]
	fn test_auth_response_tolerates_missing_fields() {
		let response = AuthResponse::from_body(json!({"message": "Invalid credentials"}));
		assert!(response.token.is_none());
		assert!(response.user.is_none());

		let response: AuthResponse = serde_json::from_value(json!({
			"status": "success",
			"token": "1|abc",
			"user": {"id": 4, "name": "Juma", "email": "juma@example.com"}
		}))
		.unwrap();
		assert_eq!(response.token.as_deref(), Some("1|abc"));
		assert_eq!(response.user.unwrap().phone, None);
	}

	#[test]
	fn test_profile_shape_does_not_block_the_token() {
		let response = AuthResponse::from_body(json!({
			"token": "tok",
			"user": {"id": "7", "email": "juma@example.com", "phone": 711000000}
		}));
		assert_eq!(response.token.as_deref(), Some("tok"));
		let user = response.user.unwrap();
		assert_eq!((user.id, user.name.as_str()), (7, ""));
		assert_eq!(user.phone.as_deref(), Some("711000000"));

		let response = AuthResponse::from_body(json!({"token": "tok", "user": "juma"}));
		assert_eq!(response.token.as_deref(), Some("tok"));
		assert!(response.user.is_none());

		assert!(AuthResponse::from_body(json!(["tok"])).token.is_none());
	}

	#[test]
	fn test_expire_session_clears_and_tells_the_user() {
		let session = Session::in_memory();
		session.save("tok", None).unwrap();
		let notifier = RecordingNotifier::new();
		expire_session(&session, &notifier);
		assert!(!session.is_authenticated());
		let (_, message) = notifier.last().unwrap();
		assert_eq!(message, "Your session has expired. Please sign in again.");
	}

	#[test]
	fn test_register_payload_shape() {
		let data = RegisterData {
			name: "Juma".into(),
			email: "juma@example.com".into(),
			phone: "0711".into(),
			password: "secret".into(),
			password_confirmation: "secret".into(),
		};
		let value = serde_json::to_value(&data).unwrap();
		assert_eq!(value["password_confirmation"], "secret");
		assert_eq!(value.as_object().unwrap().len(), 5);
	}
}
