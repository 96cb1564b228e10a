#![allow(dead_code)]

use std::{
	path::PathBuf,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
};

use axum::{
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	routing::{get, post},
	Json, Router,
};
use car_rental_client::{
	bookings::BookingService,
	cars::CarService,
	config::Config,
	notify::{Notifier, RecordingNotifier},
	users::{AuthService, Session},
	ApiClient,
};
use serde_json::{json, Value};

pub const TOKEN: &str = "1|valid-token";
pub const EMAIL: &str = "amina@example.com";
pub const PASSWORD: &str = "secret123";
/// Account whose login reply carries a loosely typed profile.
pub const LEGACY_EMAIL: &str = "legacy@example.com";

/// In-process stand-in for the rental API.
pub struct Upstream {
	pub cars: Mutex<Value>,
	pub requests: AtomicUsize,
	pub bookings_posted: Mutex<Vec<Value>>,
	pub logouts: AtomicUsize,
	pub logout_status: Mutex<StatusCode>,
	pub subscribed: Mutex<Vec<String>>,
	pub auth_headers: Mutex<Vec<Option<String>>>,
}

impl Upstream {
	pub fn new(cars: Value) -> Arc<Self> {
		Arc::new(Upstream {
			cars: Mutex::new(cars),
			requests: AtomicUsize::new(0),
			bookings_posted: Mutex::new(Vec::new()),
			logouts: AtomicUsize::new(0),
			logout_status: Mutex::new(StatusCode::OK),
			subscribed: Mutex::new(Vec::new()),
			auth_headers: Mutex::new(Vec::new()),
		})
	}

	pub fn request_count(&self) -> usize {
		self.requests.load(Ordering::SeqCst)
	}

	fn seen(&self, headers: &HeaderMap) -> bool {
		self.requests.fetch_add(1, Ordering::SeqCst);
		let auth = headers.get("authorization").and_then(|h| h.to_str().ok()).map(str::to_owned);
		let valid = auth.as_deref() == Some(format!("Bearer {}", TOKEN).as_str());
		self.auth_headers.lock().unwrap().push(auth);
		valid
	}
}

pub fn sample_cars() -> Value {
	json!([
		{
			"id": 1, "model": "Toyota Corolla", "year": 2019, "daily_rate": "35.00",
			"category": "Sedan", "status": 1, "image_url": "upload/corolla.png"
		},
		{
			"id": 2, "model": "Range Rover", "year": 2022, "daily_rate": "150.00",
			"category": "Luxury", "status": 1, "seats": 5
		},
		{"id": 3, "model": "Mazda Demio", "year": 2016, "price": 25, "category": "popular", "status": 0},
		{"id": 4, "model": "Nissan Note", "category": null},
		{"id": 5, "model": "Mercedes S-Class", "category": "premium"}
	])
}

type Reply = (StatusCode, Json<Value>);

async fn list_cars(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Reply {
	// public route, but a revoked token is still refused
	if !up.seen(&headers) && headers.contains_key("authorization") {
		return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."})));
	}
	(StatusCode::OK, Json(up.cars.lock().unwrap().clone()))
}

async fn show_car(State(up): State<Arc<Upstream>>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
	up.seen(&headers);
	let cars = sample_cars();
	match cars.as_array().unwrap().iter().find(|c| c["id"] == id) {
		Some(car) => (StatusCode::OK, Json(json!({"success": true, "data": car}))),
		None => (StatusCode::NOT_FOUND, Json(json!({"message": "Car not found"}))),
	}
}

fn auth_ok(name: &str, email: &str) -> Reply {
	let user = json!({"id": 7, "name": name, "email": email, "phone": "0712345678"});
	(StatusCode::OK, Json(json!({"status": "success", "token": TOKEN, "user": user})))
}

async fn login(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
	up.seen(&headers);
	if body["email"] == EMAIL && body["password"] == PASSWORD {
		auth_ok("Amina", EMAIL)
	} else if body["email"] == LEGACY_EMAIL {
		(StatusCode::OK, Json(json!({"token": TOKEN, "user": {"id": "7", "email": LEGACY_EMAIL}})))
	} else {
		(StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})))
	}
}

async fn register(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
	up.seen(&headers);
	if body["email"] == EMAIL {
		let errors = json!({
			"email": ["The email has already been taken."],
			"phone": ["The phone field is required."]
		});
		return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"errors": errors})));
	}
	if body["password"] != body["password_confirmation"] {
		let mismatch = "The password confirmation does not match.";
		let reply = json!({"message": mismatch, "errors": {"password": [mismatch]}});
		return (StatusCode::UNPROCESSABLE_ENTITY, Json(reply));
	}
	auth_ok(body["name"].as_str().unwrap_or_default(), body["email"].as_str().unwrap_or_default())
}

async fn logout(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Reply {
	up.seen(&headers);
	up.logouts.fetch_add(1, Ordering::SeqCst);
	let status = *up.logout_status.lock().unwrap();
	(status, Json(json!({"message": "Logged out"})))
}

async fn create_booking(
	State(up): State<Arc<Upstream>>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Reply {
	if !up.seen(&headers) {
		return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."})));
	}
	if body["car_id"] == 3 {
		let taken = json!({"message": "This car is already booked for the selected date."});
		return (StatusCode::UNPROCESSABLE_ENTITY, Json(taken));
	}
	up.bookings_posted.lock().unwrap().push(body.clone());
	(StatusCode::CREATED, Json(json!({"success": true, "data": body})))
}

async fn list_bookings(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Reply {
	if !up.seen(&headers) {
		return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."})));
	}
	let bookings = json!([
		{
			"id": 1, "car_id": 2, "start_date": "2026-11-02", "pickup_location": "JKIA",
			"drop_location": "CBD", "passengers": 2, "status": "pending", "total_price": "300.00",
			"car": {"id": 2, "model": "Range Rover"}
		},
		{
			"id": 2, "car_id": 1, "start_date": "2026-10-01", "pickup_location": "Westlands",
			"drop_location": "Karen", "passengers": null, "status": "completed", "total_price": 70
		},
		{"id": 3, "car_id": 1, "status": "cancelled"},
		{"id": 4, "car_id": 3, "status": "confirmed"},
		{"id": "5", "car_id": "1", "pickup_location": null, "passengers": "3", "status": "pending"}
	]);
	(StatusCode::OK, Json(json!({"success": true, "data": bookings})))
}

async fn subscribe(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
	up.seen(&headers);
	let email = body["email"].as_str().unwrap_or_default().to_owned();
	up.subscribed.lock().unwrap().push(email);
	(StatusCode::OK, Json(json!({"success": true, "message": "Subscribed"})))
}

/// Serves the mock API on an ephemeral port, returning its `/api/v1` base URL.
pub async fn serve(upstream: Arc<Upstream>) -> String {
	let app = Router::new()
		.route("/api/v1/cars", get(list_cars))
		.route("/api/v1/cars/:id", get(show_car))
		.route("/api/v1/login", post(login))
		.route("/api/v1/register", post(register))
		.route("/api/v1/logout", post(logout))
		.route("/api/v1/bookings", post(create_booking).get(list_bookings))
		.route("/api/v1/newsletter/subscribe", post(subscribe))
		.with_state(upstream);

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	format!("http://{}/api/v1", addr)
}

pub struct Harness {
	pub upstream: Arc<Upstream>,
	pub api: ApiClient,
	pub notifier: Arc<RecordingNotifier>,
	pub cars: CarService,
	pub auth: AuthService,
	pub bookings: BookingService,
}

impl Harness {
	pub async fn start() -> Self {
		Harness::with_cars(sample_cars()).await
	}

	pub async fn with_cars(cars: Value) -> Self {
		let upstream = Upstream::new(cars);
		let base = serve(upstream.clone()).await;
		let config = Config::new(&base, PathBuf::from("unused-session.json"));
		let api = ApiClient::new(&config, Session::in_memory()).unwrap();
		let notifier = Arc::new(RecordingNotifier::new());
		let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
		Harness {
			cars: CarService::new(api.clone()),
			auth: AuthService::new(api.clone(), dyn_notifier.clone()),
			bookings: BookingService::new(api.clone(), dyn_notifier),
			upstream,
			api,
			notifier,
		}
	}

	pub fn dyn_notifier(&self) -> Arc<dyn Notifier> {
		self.notifier.clone()
	}

	pub fn last_message(&self) -> String {
		self.notifier.last().map(|(_, m)| m).unwrap_or_default()
	}
}
