use serde_json::Value;

pub const REGULAR: &str = "regular";

/// Labels that never fall into the regular bucket.
const CLASSIFIED: [&str; 3] = ["luxury", "popular", "premium"];

/// Home page sections, in display order.
pub const HOME_SECTIONS: [&str; 2] = ["popular", REGULAR];

/// Lowercased category of a raw record; missing or non-string reads as "".
pub fn raw_category(car: &Value) -> String {
	car.get("category").and_then(Value::as_str).unwrap_or_default().to_lowercase()
}

/// Case-insensitive category match.
///
/// "regular" is the catch-all bucket: anything not labelled luxury, popular or
/// premium lands there, including unlabelled cars. Every other request matches
/// when either lowercased string contains the other, so "lux" and "luxury" match
/// both ways. An empty label is contained in every request, so unlabelled cars
/// also show up under every non-regular category.
pub fn matches(car_category: &str, requested: &str) -> bool {
	let car_category = car_category.to_lowercase();
	let requested = requested.to_lowercase();

	if requested == REGULAR {
		return car_category == REGULAR
			|| car_category.is_empty()
			|| !CLASSIFIED.contains(&car_category.as_str());
	}
	car_category == requested || car_category.contains(&requested) || requested.contains(&car_category)
}

pub fn filter_by_category(cars: Vec<Value>, requested: &str) -> Vec<Value> {
	cars.into_iter().filter(|car| matches(&raw_category(car), requested)).collect()
}

/// "luxury" -> "Luxury"
pub fn title(category: &str) -> String {
	let mut chars = category.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

pub fn description(category: &str) -> &'static str {
	match category.to_lowercase().as_str() {
		"popular" => "Our most sought-after vehicles for your journey",
		REGULAR => "Reliable and comfortable vehicles for everyday use",
		"luxury" => "Experience ultimate comfort and style with our premium vehicles",
		_ => "Find the perfect vehicle for your needs",
	}
}
