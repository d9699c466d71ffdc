//! Transfer activity registry
//!
//! Several transfer-capable components can share the owner window's taskbar
//! progress indicator. Before the update session touches the indicator it
//! asks the window whether another transfer is active (seek/reply
//! handshake). The latest reply is cached; taskbar writes are suppressed
//! while the cached flag is set. The cached flag can be stale between
//! queries.


use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::error::ChannelError;
use crate::surface::{MessageHandler, OwnerWindow};

/// Channel carrying "is a transfer active?" requests to the owner window
pub const SEEK_CHANNEL: &str = "isFileTransferActiveSeek";

/// Channel carrying the owner window's answers
pub const REPLY_CHANNEL: &str = "isFileTransferActiveReply";

const COMPONENT: &str = "TransferActivity";

const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Serialize)]
struct SeekRequest {
    check: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ActivityReply {
    #[serde(rename = "isActive")]
    is_active: bool,
}

/// Value written to the taskbar progress indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskbarProgress {
    /// Clear/hide the indicator
    Hidden,
    /// Busy indicator without a value
    Indeterminate,
    /// Determinate fraction in `[0, 1]`
    Fraction(f64),
}

impl TaskbarProgress {
    /// Raw indicator value: `-1` hides, `2` is indeterminate, else the fraction
    pub fn as_raw(&self) -> f64 {
        match self {
            TaskbarProgress::Hidden => -1.0,
            TaskbarProgress::Indeterminate => 2.0,
            TaskbarProgress::Fraction(f) if f.is_finite() => f.clamp(0.0, 1.0),
            TaskbarProgress::Fraction(_) => 0.0,
        }
    }

    /// Interpret a raw indicator value
    pub fn from_raw(value: f64) -> Self {
        if value < 0.0 {
            TaskbarProgress::Hidden
        } else if value > 1.0 {
            TaskbarProgress::Indeterminate
        } else {
            TaskbarProgress::Fraction(value)
        }
    }
}

/// Process-wide activity state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferActivityState {
    /// Another component owns the taskbar indicator
    pub active: bool,
    /// Reply listener has been registered
    pub seek_wired: bool,
}

/// Registry answering "is any transfer active" for the owner window.
///
/// Cloning shares state; create one per process.
#[derive(Clone)]
pub struct TransferActivityRegistry {
    state: Arc<Mutex<TransferActivityState>>,
    replies: Arc<watch::Sender<bool>>,
    /// Held across check, register and mark so the listener attaches once
    wiring: Arc<Mutex<()>>,
    reply_timeout: Duration,
}

impl Default for TransferActivityRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_TIMEOUT)
    }
}

impl TransferActivityRegistry {
    pub fn new(reply_timeout: Duration) -> Self {
        let (replies, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(TransferActivityState::default())),
            replies: Arc::new(replies),
            wiring: Arc::new(Mutex::new(())),
            reply_timeout,
        }
    }

    /// Snapshot of the registry state
    pub fn state(&self) -> TransferActivityState {
        *self.state.lock()
    }

    /// Latest known activity flag
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Send a seek request without waiting for the answer.
    ///
    /// Wires the reply listener on first use.
    pub fn request_status(&self, owner: &Arc<dyn OwnerWindow>) -> Result<(), ChannelError> {
        self.wire_reply_listener(owner)?;

        let request = serde_json::to_value(SeekRequest { check: true })
            .map_err(|e| ChannelError::send_failed(SEEK_CHANNEL, e))?;
        owner.send(SEEK_CHANNEL, request)
    }

    /// Ask the owner window whether a transfer is active.
    ///
    /// Waits up to the reply timeout for an answer, then returns the latest
    /// known flag, which may predate this request.
    pub async fn query_active(&self, owner: &Arc<dyn OwnerWindow>) -> bool {
        let mut replies = self.replies.subscribe();

        if let Err(e) = self.request_status(owner) {
            tracing::warn!(component = COMPONENT, error = %e, "Transfer activity query failed, using cached flag");
            return self.is_active();
        }

        if tokio::time::timeout(self.reply_timeout, replies.changed())
            .await
            .is_err()
        {
            tracing::debug!(
                component = COMPONENT,
                timeout_ms = self.reply_timeout.as_millis() as u64,
                "No transfer activity reply in time, using cached flag"
            );
        }

        self.is_active()
    }

    /// Write the owner's taskbar indicator unless another transfer owns it.
    ///
    /// Returns whether the write was applied.
    pub fn set_taskbar_progress(
        &self,
        owner: &Arc<dyn OwnerWindow>,
        progress: TaskbarProgress,
    ) -> bool {
        if self.is_active() {
            tracing::trace!(component = COMPONENT, ?progress, "Transfer active elsewhere, taskbar write suppressed");
            return false;
        }

        owner.set_progress_bar(progress.as_raw());
        true
    }

    fn wire_reply_listener(&self, owner: &Arc<dyn OwnerWindow>) -> Result<(), ChannelError> {
        let _wiring = self.wiring.lock();
        if self.state.lock().seek_wired {
            return Ok(());
        }

        let state = Arc::clone(&self.state);
        let replies = Arc::clone(&self.replies);
        let handler: MessageHandler = Arc::new(move |payload: serde_json::Value| {
            match serde_json::from_value::<ActivityReply>(payload) {
                Ok(reply) => {
                    state.lock().active = reply.is_active;
                    replies.send_replace(reply.is_active);
                    tracing::debug!(component = COMPONENT, active = reply.is_active, "Transfer activity reply received");
                }
                Err(e) => {
                    tracing::warn!(component = COMPONENT, channel = REPLY_CHANNEL, error = %e, "Malformed transfer activity reply");
                }
            }
        });

        owner.on_message(REPLY_CHANNEL, handler)?;
        self.state.lock().seek_wired = true;
        Ok(())
    }
}
