//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Target prefix of every record this crate emits
pub const SESSION_TARGET: &str = "update_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    pub fn writes_console(&self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    pub fn writes_file(&self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging section of the updater configuration.
///
/// The host's own records fall under `base_level`; the update session's
/// records (target `update_session`) under `session_level`, so the session
/// can be traced without turning up every dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_base_level")]
    pub base_level: LogLevel,

    #[serde(default)]
    pub session_level: LogLevel,

    /// Extra `target = level` directives, applied after the two above
    #[serde(default)]
    pub targets: BTreeMap<String, LogLevel>,

    /// Only write events tagged with a `component` field
    #[serde(default)]
    pub components_only: bool,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// File output directory; platform data dir when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,
}

fn default_base_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            base_level: default_base_level(),
            session_level: LogLevel::Info,
            targets: BTreeMap::new(),
            components_only: false,
            format: LogFormat::Text,
            output: LogOutput::Console,
            directory: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Filter directives, most general first
    pub fn directives(&self) -> Vec<String> {
        let mut directives = vec![
            self.base_level.to_string(),
            format!("{}={}", SESSION_TARGET, self.session_level),
        ];
        directives.extend(
            self.targets
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        directives
    }

    /// Directory file output goes to
    pub fn log_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("update-session")
                .join("logs")
        })
    }
}
