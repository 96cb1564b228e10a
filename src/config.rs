use std::{env, path::PathBuf, time::Duration};

use crate::error::ApiError;

pub const API_URL_VAR: &str = "CAR_RENTAL_API_URL";
pub const SESSION_FILE_VAR: &str = "CAR_RENTAL_SESSION_FILE";
pub const TIMEOUT_VAR: &str = "CAR_RENTAL_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
	pub api_url: String,
	pub session_file: PathBuf,
	pub timeout: Duration,
}

impl Config {
	pub fn new(api_url: &str, session_file: PathBuf) -> Self {
		Config {
			api_url: api_url.trim_end_matches('/').to_owned(),
			session_file,
			timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
		}
	}

	/// Reads `.env` (when present) and then the process environment; explicit
	/// values take precedence.
	pub fn load(api_url: Option<String>, session_file: Option<PathBuf>) -> Result<Self, ApiError> {
		dotenv::dotenv().ok();

		let api_url = match api_url {
			Some(url) => url,
			None => env::var(API_URL_VAR)
				.map_err(|_| ApiError::Config(format!("{} is not set", API_URL_VAR)))?,
		};
		if api_url.trim().is_empty() {
			return Err(ApiError::Config(format!("{} is empty", API_URL_VAR)));
		}
		let session_file = session_file
			.or_else(|| env::var(SESSION_FILE_VAR).ok().map(PathBuf::from))
			.unwrap_or_else(default_session_file);
		let timeout = match env::var(TIMEOUT_VAR) {
			Ok(secs) => secs.trim().parse().map_err(|_| {
				ApiError::Config(format!("{} must be a number of seconds, got {:?}", TIMEOUT_VAR, secs))
			})?,
			Err(_) => DEFAULT_TIMEOUT_SECS,
		};

		let mut config = Config::new(api_url.trim(), session_file);
		config.timeout = Duration::from_secs(timeout);
		Ok(config)
	}

	/// Host part of the API URL, used to resolve relative image paths.
	pub fn asset_base(&self) -> &str {
		asset_base(&self.api_url)
	}
}

pub fn asset_base(api_url: &str) -> &str {
	let api_url = api_url.trim_end_matches('/');
	api_url.strip_suffix("/api/v1").unwrap_or(api_url)
}

fn default_session_file() -> PathBuf {
	match env::var_os("HOME") {
		Some(home) => PathBuf::from(home).join(".car_rental").join("session.json"),
		None => PathBuf::from(".car_rental_session.json"),
	}
}
