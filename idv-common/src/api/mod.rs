//! Upload wire contract shared by the capture client and the relay
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure types and functions (no HTTP framework dependencies)
//! - The names both sides must agree on (path, part names, file names)
//!
//! Each side wraps these with its own HTTP stack (axum on the relay,
//! reqwest on the capture client).

pub mod bundle;
pub mod types;

pub use bundle::{Artifact, ArtifactRole, BundleBuilder, MissingParts, UploadBundle};
pub use types::{ErrorBody, UploadAck};

/// Relay upload endpoint
pub const UPLOAD_PATH: &str = "/api/enviar-a-telegram";
