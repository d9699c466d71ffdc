//! Error types for the update session core
//!
//! Nothing in this crate surfaces these past its own boundary: the
//! controller terminates every failure in a notice and/or a log entry.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for update session operations
pub type Result<T> = std::result::Result<T, UpdateSessionError>;

/// Main error type for the update session core
#[derive(Error, Debug)]
pub enum UpdateSessionError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the update engine collaborator
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to subscribe to {event}: {reason}")]
    SubscribeFailed { event: String, reason: String },

    #[error("Update check failed: {reason}")]
    CheckFailed { reason: String },

    #[error("Update download failed: {reason}")]
    DownloadFailed { reason: String },
}

/// Errors raised by the display surface collaborator
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Surface creation failed: {reason}")]
    CreateFailed { reason: String },

    #[error("Failed to load view {route}: {reason}")]
    LoadFailed { route: String, reason: String },

    #[error("Surface already destroyed")]
    Destroyed,
}

/// Errors raised by in-process message channels
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to send on {channel}: {reason}")]
    SendFailed { channel: String, reason: String },

    #[error("Failed to listen on {channel}: {reason}")]
    ListenFailed { channel: String, reason: String },

    #[error("Malformed payload on {channel}: {reason}")]
    Malformed { channel: String, reason: String },
}

impl ChannelError {
    /// Build a send failure for `channel`
    pub fn send_failed(channel: &str, reason: impl ToString) -> Self {
        ChannelError::SendFailed {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}
