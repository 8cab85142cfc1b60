mod backend;
mod client;
mod error;
pub mod mock;

pub use backend::PackoutBackend;
pub use client::ApiClient;
pub use error::ApiError;
