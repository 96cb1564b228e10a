use std::{
	collections::HashMap,
	fs,
	path::PathBuf,
	sync::{Arc, Mutex},
};

use log::{debug, warn};
use serde_json::{Map, Value};

use super::users::User;
use crate::error::ApiError;

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user";

/// String key/value storage the session lives in. Last write wins.
pub trait SessionStore: Send + Sync {
	fn get(&self, key: &str) -> Result<Option<String>, ApiError>;
	fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;
	fn remove(&self, key: &str) -> Result<(), ApiError>;
}

#[derive(Default)]
pub struct MemoryStore(Mutex<HashMap<String, String>>);

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn poisoned<T>(_: T) -> ApiError {
	ApiError::Storage("session store lock poisoned".to_owned())
}

impl SessionStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
		Ok(self.0.lock().map_err(poisoned)?.get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
		self.0.lock().map_err(poisoned)?.insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), ApiError> {
		self.0.lock().map_err(poisoned)?.remove(key);
		Ok(())
	}
}

/// A JSON object on disk, rewritten whole on every change.
pub struct FileStore {
	path: PathBuf,
}

impl FileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		FileStore { path: path.into() }
	}

	fn load(&self) -> Result<Map<String, Value>, ApiError> {
		let raw = match fs::read_to_string(&self.path) {
			Ok(raw) => raw,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
			Err(e) => return Err(ApiError::Storage(format!("reading {}: {}", self.path.display(), e))),
		};
		if raw.trim().is_empty() {
			return Ok(Map::new());
		}
		match serde_json::from_str::<Value>(&raw) {
			Ok(Value::Object(map)) => Ok(map),
			Ok(_) | Err(_) => {
				warn!("session file {} is not a JSON object, starting empty", self.path.display());
				Ok(Map::new())
			}
		}
	}

	fn save(&self, map: &Map<String, Value>) -> Result<(), ApiError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.map_err(|e| ApiError::Storage(format!("creating {}: {}", parent.display(), e)))?;
		}
		let body = serde_json::to_string_pretty(map).map_err(|e| ApiError::Storage(e.to_string()))?;
		fs::write(&self.path, body)
			.map_err(|e| ApiError::Storage(format!("writing {}: {}", self.path.display(), e)))
	}
}

impl SessionStore for FileStore {
	fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
		Ok(self.load()?.get(key).and_then(Value::as_str).map(str::to_owned))
	}

	fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
		let mut map = self.load()?;
		map.insert(key.to_owned(), Value::String(value.to_owned()));
		self.save(&map)
	}

	fn remove(&self, key: &str) -> Result<(), ApiError> {
		let mut map = self.load()?;
		if map.remove(key).is_some() {
			self.save(&map)?;
		}
		Ok(())
	}
}

/// The signed-in state (bearer token + profile), handed to whoever needs it.
#[derive(Clone)]
pub struct Session {
	store: Arc<dyn SessionStore>,
}

impl Session {
	pub fn new(store: Arc<dyn SessionStore>) -> Self {
		Session { store }
	}

	pub fn in_memory() -> Self {
		Session::new(Arc::new(MemoryStore::new()))
	}

	pub fn token(&self) -> Option<String> {
		match self.store.get(TOKEN_KEY) {
			Ok(token) => token.filter(|t| !t.is_empty()),
			Err(e) => {
				warn!("could not read token: {}", e);
				None
			}
		}
	}

	pub fn user(&self) -> Option<User> {
		let raw = self.store.get(USER_KEY).ok()??;
		match serde_json::from_str(&raw) {
			Ok(user) => Some(user),
			Err(e) => {
				debug!("stored user is unreadable: {}", e);
				None
			}
		}
	}

	/// Presence check only; the token is never validated locally.
	pub fn is_authenticated(&self) -> bool {
		self.token().is_some()
	}

	pub fn save(&self, token: &str, user: Option<&User>) -> Result<(), ApiError> {
		self.store.set(TOKEN_KEY, token)?;
		match user {
			Some(user) => {
				let user = serde_json::to_string(user).map_err(|e| ApiError::Storage(e.to_string()))?;
				self.store.set(USER_KEY, &user)
			}
			None => self.store.remove(USER_KEY),
		}
	}

	pub fn clear(&self) -> Result<(), ApiError> {
		self.store.remove(TOKEN_KEY)?;
		self.store.remove(USER_KEY)
	}
}
