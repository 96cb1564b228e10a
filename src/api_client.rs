use log::{debug, error};
use reqwest::{
	header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
	Client, RequestBuilder, Response,
};
use serde::Serialize;
use serde_json::Value;

use crate::{config::Config, error::ApiError, users::session::Session};

/// Thin wrapper over the upstream rental API. Attaches the bearer token when one is stored.
#[derive(Clone)]
pub struct ApiClient {
	http: Client,
	base_url: String,
	session: Session,
}

impl ApiClient {
	pub fn new(config: &Config, session: Session) -> Result<Self, ApiError> {
		let mut headers = HeaderMap::new();
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		let http = Client::builder().default_headers(headers).timeout(config.timeout).build()?;

		Ok(ApiClient { http, base_url: config.api_url.clone(), session })
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
		match self.session.token() {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}

	pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
		debug!("GET {}", path);
		let request = self.authorized(self.http.get(self.url(path)));
		self.send(path, request).await
	}

	pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
		debug!("POST {}", path);
		let request = self.authorized(self.http.post(self.url(path)).json(body));
		self.send(path, request).await
	}

	async fn send(&self, path: &str, request: RequestBuilder) -> Result<Value, ApiError> {
		let response = request.send().await.map_err(|e| {
			error!("API Error: {} failed: {}", path, e);
			ApiError::Network(e)
		})?;
		decode(path, response).await
	}
}

async fn decode(path: &str, response: Response) -> Result<Value, ApiError> {
	let status = response.status();
	let text = response.text().await?;
	let body = if text.trim().is_empty() {
		Value::Null
	} else {
		match serde_json::from_str(&text) {
			Ok(body) => body,
			Err(_) if !status.is_success() => Value::Null,
			Err(e) => {
				error!("API Error: {} returned non-JSON body: {}", path, e);
				return Err(ApiError::MalformedResponse(format!("{} returned a body that is not JSON", path)));
			}
		}
	};

	if status.is_success() {
		return Ok(body);
	}
	let err = ApiError::from_response(status, &body);
	error!("API Error: {} -> {} ({})", path, status, err);
	Err(err)
}
