//! Capture controller configuration
//!
//! Every field has a default, so an empty or missing TOML file yields a
//! working configuration.

use idv_common::api::UPLOAD_PATH;
use idv_common::config::load_toml_or_default;
use idv_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Video encodings tried in order
pub const DEFAULT_ENCODING_PREFERENCES: [&str; 4] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
    "video/mp4",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Absolute URL of the relay upload endpoint
    pub upload_url: String,

    /// Page to navigate to after a successful upload
    pub success_url: String,

    /// Selfie video length
    pub recording_seconds: u32,

    /// JPEG quality for document photos, in (0, 1]
    pub jpeg_quality: f32,

    pub encoding_preferences: Vec<String>,

    pub upload_timeout_secs: u64,

    /// How long a new stream may take to report its dimensions
    pub camera_ready_timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            upload_url: format!("http://127.0.0.1:3000{}", UPLOAD_PATH),
            success_url: "https://tu-web.com/verificacion-exitosa.html".to_string(),
            recording_seconds: 30,
            jpeg_quality: 0.9,
            encoding_preferences: DEFAULT_ENCODING_PREFERENCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            upload_timeout_secs: 120,
            camera_ready_timeout_secs: 10,
        }
    }
}

impl CaptureConfig {
    /// Load from TOML, falling back to defaults when the file is absent
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = load_toml_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recording_seconds == 0 {
            return Err(Error::Config("recording_seconds must be greater than 0".to_string()));
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(Error::Config(format!(
                "jpeg_quality must be in (0, 1], got {}",
                self.jpeg_quality
            )));
        }
        if self.encoding_preferences.is_empty() {
            return Err(Error::Config("encoding_preferences must not be empty".to_string()));
        }
        if self.upload_timeout_secs == 0 || self.camera_ready_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn camera_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.camera_ready_timeout_secs)
    }
}
