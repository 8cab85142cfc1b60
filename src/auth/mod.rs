//! Authentication session models and the durable session store

mod session;
mod store;

pub use session::{AuthSession, UserProfile, UserRole};
pub use store::SessionStore;
