//! HTTP API handlers for idv-relay

pub mod health;
pub mod upload;

pub use health::health_routes;
pub use upload::{relay_upload, upload_routes};
