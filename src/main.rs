use std::{path::PathBuf, process, sync::Arc};

use anyhow::Context;
use car_rental_client::{
	bookings::{bookings::paginate, Booking, BookingForm, BookingService, BookingStatus},
	cars::{category, Car, CarService},
	config::Config,
	newsletter,
	notify::{Notifier, TerminalNotifier},
	users::{users::RegisterData, AuthService, FileStore, Session},
	ApiClient, ApiError,
};
use clap::{Parser, Subcommand};
use log::error;

#[derive(Parser, Debug)]
#[command(name = "car_rental", about = "Browse rental cars, book one and review your bookings")]
struct Opt {
	/// Upstream API base URL (overrides CAR_RENTAL_API_URL)
	#[arg(long)]
	api_url: Option<String>,

	/// Where the signed-in session is kept (overrides CAR_RENTAL_SESSION_FILE)
	#[arg(long)]
	session_file: Option<PathBuf>,

	/// Debug logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Popular and regular cars, as on the home page
	Home,
	/// List cars, optionally only one category
	Cars {
		#[arg(short, long)]
		category: Option<String>,
	},
	/// Show one car
	Car { id: u64 },
	Login { email: String, password: String },
	Register {
		#[arg(long)]
		name: String,
		#[arg(long)]
		email: String,
		#[arg(long)]
		phone: String,
		#[arg(long)]
		password: String,
		/// Defaults to --password
		#[arg(long)]
		password_confirmation: Option<String>,
	},
	Logout,
	/// Request a booking for a car
	Book {
		car_id: u64,
		#[arg(long)]
		pickup: String,
		#[arg(long)]
		drop: String,
		/// YYYY-MM-DD
		#[arg(long)]
		date: String,
		#[arg(long, default_value_t = 1)]
		passengers: u32,
		#[arg(long)]
		phone: String,
		#[arg(long)]
		note: Option<String>,
	},
	/// Your bookings, three per page
	Bookings {
		#[arg(long, default_value_t = 1)]
		page: usize,
	},
	/// Account overview
	Dashboard,
	/// Subscribe to the newsletter
	Subscribe { email: String },
}

struct App {
	api: ApiClient,
	cars: CarService,
	auth: AuthService,
	bookings: BookingService,
	notifier: Arc<dyn Notifier>,
}

impl App {
	fn new(config: &Config) -> anyhow::Result<Self> {
		let session = Session::new(Arc::new(FileStore::new(&config.session_file)));
		let api = ApiClient::new(config, session).context("building HTTP client")?;
		let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
		Ok(App {
			cars: CarService::new(api.clone()),
			auth: AuthService::new(api.clone(), notifier.clone()),
			bookings: BookingService::new(api.clone(), notifier.clone()),
			api,
			notifier,
		})
	}

	/// Mirrors the private routes: nothing is fetched when signed out.
	fn require_session(&self) -> bool {
		if self.auth.is_authenticated() {
			return true;
		}
		prompt_login();
		false
	}

	async fn run(&self, command: Command) -> bool {
		match command {
			Command::Home => {
				let mut ok = true;
				for section in category::HOME_SECTIONS {
					ok &= self.category_section(section).await;
				}
				ok
			}
			Command::Cars { category: Some(requested) } => self.category_section(&requested).await,
			Command::Cars { category: None } => match self.cars.listing().await {
				Ok(cars) => {
					self.print_grid(&cars, "No cars available at the moment.");
					true
				}
				Err(e) => self.failed(&e, "Failed to load cars"),
			},
			Command::Car { id } => match self.cars.car(id).await {
				Ok(car) => {
					self.print_car(&car);
					true
				}
				Err(e) => self.failed(&e, "Failed to load car"),
			},
			Command::Login { email, password } => self.auth.login(&email, &password).await.is_ok(),
			Command::Register { name, email, phone, password, password_confirmation } => {
				let password_confirmation = password_confirmation.unwrap_or_else(|| password.clone());
				let data = RegisterData { name, email, phone, password, password_confirmation };
				self.auth.register(&data).await.is_ok()
			}
			Command::Logout => self.auth.logout().await.is_ok(),
			Command::Book { car_id, pickup, drop, date, passengers, phone, note } => {
				let form = BookingForm {
					pickup_location: pickup,
					drop_location: drop,
					start_date: date,
					passengers,
					phone,
					note,
				};
				match self.bookings.submit(car_id, form).await {
					Ok(_) => true,
					Err(ApiError::NotSignedIn) | Err(ApiError::Unauthenticated(_)) => {
						prompt_login();
						false
					}
					Err(_) => false,
				}
			}
			Command::Bookings { page } => {
				if !self.require_session() {
					return false;
				}
				match self.bookings.my_bookings().await {
					Ok(bookings) => {
						print_bookings(&bookings, page);
						true
					}
					Err(e) => self.session_failure(&e),
				}
			}
			Command::Dashboard => {
				if !self.require_session() {
					return false;
				}
				match self.auth.current_user() {
					Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
					None => println!("Signed in"),
				}
				match self.bookings.my_bookings().await {
					Ok(bookings) => {
						print_status_summary(&bookings);
						print_bookings(&bookings, 1);
						true
					}
					Err(e) => self.session_failure(&e),
				}
			}
			Command::Subscribe { email } => {
				newsletter::subscribe(&self.api, &self.notifier, &email).await.is_ok()
			}
		}
	}

	async fn category_section(&self, requested: &str) -> bool {
		println!("\n== {} ==\n{}\n", category::title(requested), category::description(requested));
		match self.cars.cars_by_category(requested).await {
			Ok(cars) => {
				self.print_grid(&cars, "No cars available in this category at the moment.");
				true
			}
			Err(e) => self.failed(&e, "Failed to load cars"),
		}
	}

	fn failed(&self, e: &ApiError, fallback: &str) -> bool {
		error!("{}", e);
		if e.is_unauthenticated() {
			self.auth.expire_session();
			prompt_login();
		} else {
			self.notifier.error(&e.user_message(fallback));
		}
		false
	}

	fn session_failure(&self, e: &ApiError) -> bool {
		if matches!(e, ApiError::NotSignedIn | ApiError::Unauthenticated(_)) {
			prompt_login();
		}
		false
	}

	fn print_grid(&self, cars: &[Car], empty: &str) {
		if cars.is_empty() {
			println!("{}", empty);
			return;
		}
		for car in cars {
			self.print_car(car);
		}
	}

	fn print_car(&self, car: &Car) {
		let availability = if car.is_available() { "Available" } else { "Not Available" };
		println!("#{} {} ({}) - {}/day [{}]", car.id, car.model, car.year, car.daily_rate, availability);
		println!(
			"    {} | {} seats | {} doors | {} | {}",
			car.category, car.seats, car.doors, car.fuel_type, car.transmission
		);
		if !car.description.is_empty() {
			println!("    {}", car.description);
		}
		println!("    {}", self.cars.image_url(car));
	}
}

fn prompt_login() {
	eprintln!("Please sign in first: car_rental login <email> <password>");
}

fn print_status_summary(bookings: &[Booking]) {
	let count = |status: BookingStatus| bookings.iter().filter(|b| b.status == status).count();
	println!(
		"{} booking{}: {} pending, {} confirmed, {} completed, {} cancelled",
		bookings.len(),
		if bookings.len() == 1 { "" } else { "s" },
		count(BookingStatus::Pending),
		count(BookingStatus::Confirmed),
		count(BookingStatus::Completed),
		count(BookingStatus::Cancelled),
	);
}

fn print_bookings(bookings: &[Booking], page: usize) {
	if bookings.is_empty() {
		println!("No bookings yet. Browse our cars and book your first ride!");
		return;
	}
	let page = paginate(bookings, page);
	for booking in page.items {
		println!("#{} {} [{}]", booking.id, booking.car_model(), booking.status);
		println!("    Pickup: {} -> Drop-off: {}", booking.pickup_location, booking.drop_location);
		println!("    Start Date: {}", booking.start_date.as_deref().unwrap_or("N/A"));
		match booking.passengers {
			Some(n) => println!("    Passengers: {}", n),
			None => println!("    Passengers: N/A"),
		}
		if let Some(note) = booking.note.as_deref().filter(|n| !n.is_empty()) {
			println!("    Note: {}", note);
		}
		if let Some(total) = &booking.total_price {
			println!("    Total Price: ${}", total);
		}
	}
	println!("Page {} of {}", page.number, page.total_pages);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let opt = Opt::parse();

	let default_level = if opt.verbose { "debug" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

	let config = Config::load(opt.api_url, opt.session_file)?;
	let app = App::new(&config)?;

	if !app.run(opt.command).await {
		process::exit(1);
	}
	Ok(())
}
