//! HTTP adapter for the album catalog REST API.

pub mod api_types;
pub mod client;
pub mod error;
pub mod types;

pub use client::CatalogClient;
pub use error::ApiError;
