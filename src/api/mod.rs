mod auth;
pub mod cache;
pub mod client;
pub mod error;
mod matches;
mod scores;
mod shooters;
pub mod types;

pub use cache::{clear_cache, get_cache_path, ResponseCache};
pub use client::{ApiClient, ApiConfig};
pub use error::ApiError;
