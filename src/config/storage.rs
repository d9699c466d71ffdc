//! Updater configuration storage
//!
//! JSON file-backed configuration with per-field defaults, so a partial
//! file on disk only overrides what it names. Writes go through a temp
//! file and an atomic rename.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::logging::LoggingConfig;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Let the engine download updates in the background without asking
    #[serde(default)]
    pub auto_download: bool,

    /// Whether the app runs from a packaged build
    #[serde(default = "default_true")]
    pub is_packaged: bool,

    /// Engine config override, only applied to unpackaged builds
    #[serde(default = "default_update_config_path")]
    pub update_config_path: PathBuf,

    /// Route of the shared progress view
    #[serde(default = "default_progress_view_route")]
    pub progress_view_route: String,

    /// Progress surface window options
    #[serde(default)]
    pub surface: SurfaceOptions,

    /// Connectivity probe settings
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// How long `query_active` waits for a reply before using the cached flag
    #[serde(default = "default_activity_reply_timeout_ms")]
    pub activity_reply_timeout_ms: u64,

    /// Log filter and sinks
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Options used when creating the progress surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOptions {
    #[serde(default = "default_surface_title")]
    pub title: String,
    #[serde(default = "default_surface_width")]
    pub width: u32,
    #[serde(default = "default_surface_height")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub modal: bool,
    #[serde(default = "default_true")]
    pub show: bool,
    #[serde(default)]
    pub resizable: bool,
    #[serde(default)]
    pub minimizable: bool,
    #[serde(default)]
    pub maximizable: bool,
    #[serde(default)]
    pub fullscreenable: bool,
    #[serde(default)]
    pub movable: bool,
}

/// Connectivity probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// URL probed with a HEAD request
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    /// Probe timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_update_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("update-session")
        .join("dev-app-update.yml")
}

fn default_progress_view_route() -> String {
    "#progressbarPage".to_string()
}

fn default_activity_reply_timeout_ms() -> u64 {
    500
}

fn default_surface_title() -> String {
    "Progress...".to_string()
}

fn default_surface_width() -> u32 {
    600
}

fn default_surface_height() -> u32 {
    150
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            title: default_surface_title(),
            width: default_surface_width(),
            height: default_surface_height(),
            modal: true,
            show: true,
            resizable: false,
            minimizable: false,
            maximizable: false,
            fullscreenable: false,
            movable: false,
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl ConnectivityConfig {
    /// Probe timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            auto_download: false,
            is_packaged: true,
            update_config_path: default_update_config_path(),
            progress_view_route: default_progress_view_route(),
            surface: SurfaceOptions::default(),
            connectivity: ConnectivityConfig::default(),
            activity_reply_timeout_ms: default_activity_reply_timeout_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl UpdaterConfig {
    /// Reply timeout for the transfer activity handshake
    pub fn activity_reply_timeout(&self) -> Duration {
        Duration::from_millis(self.activity_reply_timeout_ms)
    }

    /// Config path override the engine should use, if any
    pub fn engine_config_override(&self) -> Option<&Path> {
        if self.is_packaged {
            None
        } else {
            Some(self.update_config_path.as_path())
        }
    }

    /// Check field ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.progress_view_route.is_empty() {
            return Err(ConfigError::Invalid(
                "progress_view_route must not be empty".to_string(),
            ));
        }
        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size must be positive, got {}x{}",
                self.surface.width, self.surface.height
            )));
        }
        if self.connectivity.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "connectivity.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: UpdaterConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub async fn load_or_default(path: &Path) -> ConfigResult<Self> {
        match Self::load(path).await {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => {
                tracing::debug!("No updater config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Save configuration with an atomic write
    pub async fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;

        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &content).await?;
        tokio::fs::rename(&temp_path, path).await?;

        Ok(())
    }
}
