//! # IDV Common Library
//!
//! Shared code for the identity-verification capture client and relay:
//! - Upload wire contract (endpoint path, part names, bundle, response bodies)
//! - Error types
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
