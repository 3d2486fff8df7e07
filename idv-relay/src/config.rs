//! Configuration for idv-relay
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--port`, `--static-dir`, ...)
//! 2. Environment variables (`PORT`, `TELEGRAM_BOT_TOKEN`, ...)
//! 3. TOML configuration file (`--config`, else `<config_dir>/idv/idv-relay.toml`)
//! 4. Built-in defaults (code constants)
//!
//! Tiers 1 and 2 are merged by clap (`env = ...`). The Telegram secrets are
//! only accepted from tiers 1 and 2; they never belong in a config file.

use clap::Parser;
use idv_common::config::{load_toml_or_default, resolve_config_path};
use idv_common::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::services::telegram_client::{TelegramCredentials, TELEGRAM_API_BASE};

pub const MODULE_NAME: &str = "idv-relay";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "public";
/// Per-file upload limit (50 MiB)
const DEFAULT_MAX_FILE_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for idv-relay
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "idv-relay")]
#[command(about = "Relays identity-verification captures to a Telegram channel")]
#[command(version)]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "IDV_RELAY_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding the page shell and client script
    #[arg(long, env = "IDV_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "IDV_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum size of a single uploaded file, in bytes
    #[arg(long, env = "IDV_MAX_FILE_BYTES")]
    pub max_file_bytes: Option<usize>,

    /// Timeout for each Telegram API call, in seconds
    #[arg(long, env = "IDV_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_BASE")]
    pub telegram_api_base: Option<String>,

    /// Bot authentication token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Destination chat/channel identifier
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub chat_id: Option<String>,

    /// Start without credentials and fail uploads with 500 instead of exiting
    #[arg(long, env = "IDV_DEFER_CREDENTIALS")]
    pub defer_credentials: bool,
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default)]
    pub max_file_bytes: Option<usize>,

    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,

    #[serde(default)]
    pub telegram_api_base: Option<String>,

    #[serde(default)]
    pub defer_credentials: Option<bool>,
}

/// Fully resolved relay settings
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub max_file_bytes: usize,
    pub upstream_timeout: Duration,
    pub telegram_api_base: String,
    /// None only when `defer_credentials` is set
    pub credentials: Option<TelegramCredentials>,
    pub defer_credentials: bool,
}

impl RelaySettings {
    /// Resolve settings from parsed arguments plus the TOML file they point at
    pub fn load(args: Args) -> Result<Self> {
        let path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
        let toml_config: TomlConfig = load_toml_or_default(path.as_deref())?;
        Self::resolve(args, toml_config)
    }

    /// Merge argument/environment values over TOML values over defaults
    pub fn resolve(args: Args, toml_config: TomlConfig) -> Result<Self> {
        let defer_credentials =
            args.defer_credentials || toml_config.defer_credentials.unwrap_or(false);

        let credentials = match (non_blank(args.bot_token), non_blank(args.chat_id)) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramCredentials::new(bot_token, chat_id)),
            (token, chat) => {
                let mut missing = Vec::new();
                if token.is_none() {
                    missing.push("TELEGRAM_BOT_TOKEN");
                }
                if chat.is_none() {
                    missing.push("TELEGRAM_CHAT_ID");
                }

                if !defer_credentials {
                    return Err(Error::Config(format!(
                        "Missing required environment: {}",
                        missing.join(", ")
                    )));
                }

                warn!(
                    "Telegram credentials not configured ({}); uploads will fail with 500",
                    missing.join(", ")
                );
                None
            }
        };

        let max_file_bytes = args
            .max_file_bytes
            .or(toml_config.max_file_bytes)
            .unwrap_or(DEFAULT_MAX_FILE_BYTES);
        if max_file_bytes == 0 {
            return Err(Error::Config("max_file_bytes must be greater than 0".to_string()));
        }

        let upstream_timeout_secs = args
            .upstream_timeout_secs
            .or(toml_config.upstream_timeout_secs)
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

        Ok(Self {
            host: args
                .host
                .or(toml_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            static_dir: args
                .static_dir
                .or(toml_config.static_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            max_file_bytes,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            telegram_api_base: args
                .telegram_api_base
                .or(toml_config.telegram_api_base)
                .unwrap_or_else(|| TELEGRAM_API_BASE.to_string()),
            credentials,
            defer_credentials,
        })
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                Error::Config(format!(
                    "Invalid bind address {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
