//! Update engine seam
//!
//! The engine that checks for, downloads and installs updates is an
//! external collaborator. It reports progress through a finite set of
//! lifecycle events; consumers register one handler per event kind.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::core::error::EngineError;

/// Lifecycle event kinds emitted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateEventKind {
    Error,
    UpdateAvailable,
    DownloadProgress,
    UpdateDownloaded,
    CheckingForUpdate,
    UpdateNotAvailable,
}

impl UpdateEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateEventKind::Error => "error",
            UpdateEventKind::UpdateAvailable => "update-available",
            UpdateEventKind::DownloadProgress => "download-progress",
            UpdateEventKind::UpdateDownloaded => "update-downloaded",
            UpdateEventKind::CheckingForUpdate => "checking-for-update",
            UpdateEventKind::UpdateNotAvailable => "update-not-available",
        }
    }
}

impl std::fmt::Display for UpdateEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Download progress reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    /// Percentage, 0-100; engines may omit it
    pub percent: Option<f64>,
    pub transferred: Option<u64>,
    pub total: Option<u64>,
    pub bytes_per_second: Option<u64>,
}

impl DownloadProgress {
    pub fn percent(percent: f64) -> Self {
        Self {
            percent: Some(percent),
            ..Default::default()
        }
    }
}

/// Lifecycle event emitted by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    /// Check or download failed; `message` carries the error text if any
    Error { message: Option<String> },
    UpdateAvailable,
    DownloadProgress(DownloadProgress),
    UpdateDownloaded,
    CheckingForUpdate,
    UpdateNotAvailable,
}

impl UpdateEvent {
    pub fn error(message: impl Into<String>) -> Self {
        UpdateEvent::Error {
            message: Some(message.into()),
        }
    }

    pub fn kind(&self) -> UpdateEventKind {
        match self {
            UpdateEvent::Error { .. } => UpdateEventKind::Error,
            UpdateEvent::UpdateAvailable => UpdateEventKind::UpdateAvailable,
            UpdateEvent::DownloadProgress(_) => UpdateEventKind::DownloadProgress,
            UpdateEvent::UpdateDownloaded => UpdateEventKind::UpdateDownloaded,
            UpdateEvent::CheckingForUpdate => UpdateEventKind::CheckingForUpdate,
            UpdateEvent::UpdateNotAvailable => UpdateEventKind::UpdateNotAvailable,
        }
    }
}

/// Handler invoked for each event of a subscribed kind
pub type EventHandler = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

/// The update engine
#[async_trait]
pub trait UpdateEngine: Send + Sync {
    /// Register a handler for one event kind. Registering twice delivers twice.
    fn subscribe(&self, kind: UpdateEventKind, handler: EventHandler) -> Result<(), EngineError>;

    /// Start an update check
    async fn check_for_updates(&self) -> Result<(), EngineError>;

    /// Download the available update
    async fn download_update(&self) -> Result<(), EngineError>;

    /// Install the downloaded update and restart. Does not return control
    /// to the caller in a real engine.
    fn quit_and_install(&self);

    /// Download updates in the background as soon as they are found
    fn set_auto_download(&self, enabled: bool);

    /// Use an explicit engine config file instead of the packaged one
    fn set_config_path(&self, path: &Path);
}

/// Per-kind handler registry for engine implementations.
///
/// Handlers run synchronously in emission order, outside the registry lock.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<UpdateEventKind, Vec<EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: UpdateEventKind, handler: EventHandler) {
        self.handlers.write().entry(kind).or_default().push(handler);
    }

    /// Deliver an event to every handler of its kind
    pub fn emit(&self, event: &UpdateEvent) {
        let handlers = self
            .handlers
            .read()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        tracing::trace!(event = %event.kind(), handlers = handlers.len(), "Dispatching update event");
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of handlers registered for `kind`
    pub fn handler_count(&self, kind: UpdateEventKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, Vec::len)
    }
}
