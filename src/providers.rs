//! Transport implementations.

pub mod http;

// Re-export for convenience
pub use http::HttpStreamClient;
