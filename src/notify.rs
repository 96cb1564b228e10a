use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Success,
	Error,
}

/// Sink for short-lived user notifications (the toasts of the web front-end).
pub trait Notifier: Send + Sync {
	fn notify(&self, level: Level, message: &str);

	fn success(&self, message: &str) {
		self.notify(Level::Success, message)
	}

	fn error(&self, message: &str) {
		self.notify(Level::Error, message)
	}
}

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
	fn notify(&self, level: Level, message: &str) {
		match level {
			Level::Success => println!("✔ {}", message),
			Level::Error => eprintln!("✘ {}", message),
		}
	}
}

#[derive(Default)]
pub struct RecordingNotifier {
	seen: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn messages(&self) -> Vec<(Level, String)> {
		self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
	}

	pub fn last(&self) -> Option<(Level, String)> {
		self.messages().pop()
	}
}

impl Notifier for RecordingNotifier {
	fn notify(&self, level: Level, message: &str) {
		if let Ok(mut seen) = self.seen.lock() {
			seen.push((level, message.to_owned()));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_recording_notifier_keeps_order() {
		let notifier = RecordingNotifier::new();
		notifier.success("Logged in successfully");
		notifier.error("Failed to load cars");
		assert_eq!(notifier.messages().len(), 2);
		assert_eq!(notifier.last(), Some((Level::Error, "Failed to load cars".to_owned())));
	}
}
