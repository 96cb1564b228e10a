pub mod session;
pub mod users;

pub use session::{FileStore, MemoryStore, Session, SessionStore};
pub use users::{AuthService, User};
