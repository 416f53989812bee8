//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.epoch/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::TransportKind;
use crate::core::pending::PendingPolicy;
use crate::transport::http::DEFAULT_HTTP_URL;
use crate::transport::websocket::DEFAULT_WS_URL;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EpochConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub user_id: Option<String>,
    pub transport: Option<TransportKind>,
    pub pending_policy: Option<PendingPolicy>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WebSocketConfig {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub reveal_words_per_frame: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

/// Words revealed per animation frame; 0 shows replies instantly.
pub const DEFAULT_REVEAL_WORDS_PER_FRAME: usize = 3;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub user_id: String,
    pub transport: TransportKind,
    pub pending_policy: PendingPolicy,
    pub ws_url: String,
    pub http_url: String,
    pub reveal_words_per_frame: usize,
}

impl ResolvedConfig {
    /// URL of the selected transport.
    pub fn endpoint(&self) -> &str {
        match self.transport {
            TransportKind::WebSocket => &self.ws_url,
            TransportKind::Http => &self.http_url,
        }
    }
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides<'a> {
    pub transport: Option<TransportKind>,
    pub url: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.epoch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".epoch").join("config.toml"))
}

/// Load config from `~/.epoch/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `EpochConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<EpochConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(EpochConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<EpochConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(EpochConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: EpochConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# Epoch Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# user_id = "user_42"               # Or set EPOCH_USER_ID; a fresh id is used if unset
# transport = "websocket"           # "websocket" or "http" (EPOCH_TRANSPORT)
# pending_policy = "correlated"     # "correlated" or "single_slot"

# [websocket]
# url = "wss://fin-gpt-production.up.railway.app/epoch-ws"   # EPOCH_WS_URL

# [http]
# base_url = "http://localhost:8000"                          # EPOCH_HTTP_URL

# [display]
# reveal_words_per_frame = 3        # 0 shows replies instantly
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &EpochConfig, cli: CliOverrides<'_>) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &EpochConfig,
    cli: CliOverrides<'_>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Transport: CLI → env → config → default
    let transport = cli
        .transport
        .or_else(|| {
            env("EPOCH_TRANSPORT").and_then(|s| match TransportKind::from_str(&s, true) {
                Ok(kind) => Some(kind),
                Err(e) => {
                    warn!("Ignoring EPOCH_TRANSPORT={}: {}", s, e);
                    None
                }
            })
        })
        .or(config.general.transport)
        .unwrap_or_default();

    // User id: CLI → env → config → fresh per session
    let user_id = cli
        .user_id
        .map(|s| s.to_string())
        .or_else(|| env("EPOCH_USER_ID"))
        .or_else(|| config.general.user_id.clone())
        .unwrap_or_else(|| {
            let id = uuid::Uuid::new_v4().to_string();
            info!("No user id configured, using session id {}", id);
            id
        });

    // URLs: env → config → default; --url only replaces the selected transport's
    let mut ws_url = env("EPOCH_WS_URL")
        .or_else(|| config.websocket.url.clone())
        .unwrap_or_else(|| DEFAULT_WS_URL.to_string());
    let mut http_url = env("EPOCH_HTTP_URL")
        .or_else(|| config.http.base_url.clone())
        .unwrap_or_else(|| DEFAULT_HTTP_URL.to_string());
    if let Some(url) = cli.url {
        match transport {
            TransportKind::WebSocket => ws_url = url.to_string(),
            TransportKind::Http => http_url = url.to_string(),
        }
    }

    ResolvedConfig {
        user_id,
        transport,
        pending_policy: config.general.pending_policy.unwrap_or_default(),
        ws_url,
        http_url,
        reveal_words_per_frame: config
            .display
            .reveal_words_per_frame
            .unwrap_or(DEFAULT_REVEAL_WORDS_PER_FRAME),
    }
}
