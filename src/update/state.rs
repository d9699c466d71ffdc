//! Update session state

use serde::{Deserialize, Serialize};

/// Where the current update cycle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateState {
    /// No update cycle in progress
    #[default]
    Idle,
    /// Forced check running, indeterminate progress shown
    Checking,
    /// Update found, waiting for the user to accept the download
    AwaitingConfirmation,
    /// Downloading, determinate progress shown
    Downloading,
    /// Download complete, waiting for the user to acknowledge the install
    ReadyToInstall,
    /// Install and relaunch requested
    Installing,
}

/// Snapshot of the controller's session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSession {
    /// Core engine listeners are wired
    pub initialized: bool,
    /// Forced-check listeners are wired
    pub force_check_wired: bool,
    /// `None` with no surface pending, `Some(false)` until it is ready
    pub surface_ready: Option<bool>,
    pub state: UpdateState,
}
