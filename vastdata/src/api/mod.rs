//! VAST REST API transport

pub mod auth;
pub mod client;
pub mod common;
pub mod error;
pub mod pool;

pub use auth::Credentials;
pub use client::Client;
pub use common::{collection_path, item_path, ApiQueryParams};
pub use error::ApiError;
