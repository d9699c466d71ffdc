//! Logging setup for hosts embedding the update session
//!
//! Every collaborator logs through `tracing` with a `component` field
//! (`UpdateSession`, `ProgressSurface`, `TransferActivity`, `Connectivity`).
//! `LoggingSystem::init` installs the global subscriber: an env filter built
//! from `LoggingConfig`, then console and/or rolling-file layers, each
//! optionally narrowed to component-tagged events.

mod config;


pub use config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SESSION_TARGET};

use std::path::PathBuf;
use thiserror::Error;
use tracing::Metadata;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Field name every collaborator tags its records with
pub const COMPONENT_FIELD: &str = "component";

const LOG_FILE_PREFIX: &str = "update-session.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to create log directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

pub type LoggingResult<T> = Result<T, LoggingError>;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Installed logging; file output flushes while this is alive
pub struct LoggingSystem {
    directory: Option<PathBuf>,
    _guards: Vec<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber described by `config`
    pub fn init(config: &LoggingConfig) -> LoggingResult<Self> {
        let filter = env_filter(config)?;

        let directory = if config.output.writes_file() {
            let path = config.log_directory();
            std::fs::create_dir_all(&path).map_err(|source| LoggingError::Directory {
                path: path.clone(),
                source,
            })?;
            Some(path)
        } else {
            None
        };

        let mut guards = Vec::new();
        let console = if config.output.writes_console() {
            Some(format_layer(config, std::io::stdout, true))
        } else {
            None
        };
        let file = match &directory {
            Some(path) => {
                let appender = RollingFileAppender::new(rotation(config.rotation), path, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                guards.push(guard);
                Some(format_layer(config, writer, false))
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file)
            .try_init()
            .map_err(|e| LoggingError::Install(e.to_string()))?;

        tracing::debug!(
            target: SESSION_TARGET,
            directives = %config.directives().join(","),
            output = ?config.output,
            "Logging initialized"
        );

        Ok(Self {
            directory,
            _guards: guards,
        })
    }

    /// Directory file output goes to, when file output is on
    pub fn log_directory(&self) -> Option<&PathBuf> {
        self.directory.as_ref()
    }
}

/// Env filter for `config`'s directives
pub(crate) fn env_filter(config: &LoggingConfig) -> LoggingResult<EnvFilter> {
    EnvFilter::try_new(config.directives().join(","))
        .map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Formatting layer writing to `writer`, narrowed to tagged events when
/// `components_only` is set
pub(crate) fn format_layer<S, W>(config: &LoggingConfig, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let components_only = config.components_only;
    let tagged = filter_fn(move |meta| !components_only || carries_component(meta));

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    match config.format {
        LogFormat::Json => layer.json().with_filter(tagged).boxed(),
        LogFormat::Text => layer.with_filter(tagged).boxed(),
    }
}

/// Spans always pass; events pass when they declare a `component` field
fn carries_component(meta: &Metadata<'_>) -> bool {
    !meta.is_event() || meta.fields().field(COMPONENT_FIELD).is_some()
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => Rotation::NEVER,
    }
}
