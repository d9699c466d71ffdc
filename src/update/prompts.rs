//! User-facing copy for the update session

use crate::notice::{Notice, NoticeKind};
use crate::surface::ProgressPayload;

pub const ERROR_TITLE: &str = "Update Error";

const PLEASE_WAIT: &str = "Please wait...";

/// Progress flow shown on the progress surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFlow {
    Checking,
    Downloading,
}

impl ProgressFlow {
    pub fn title(&self) -> &'static str {
        match self {
            ProgressFlow::Checking => "Checking For Updates",
            ProgressFlow::Downloading => "Downloading Updates",
        }
    }

    /// Payload for this flow; `value` is ignored while checking
    pub fn payload(&self, value: f64) -> ProgressPayload {
        match self {
            ProgressFlow::Checking => ProgressPayload::indeterminate(self.title(), PLEASE_WAIT),
            ProgressFlow::Downloading => {
                ProgressPayload::determinate(self.title(), PLEASE_WAIT, value)
            }
        }
    }

    /// Dismissable notice shown when the flow can't start offline
    pub fn offline_notice(&self) -> Notice {
        Notice::new(self.title(), "Internet connection is unavailable.").with_buttons(["Close"])
    }
}

/// Error text shown for an engine error; `unknown` when the engine gave none
pub fn error_text(message: Option<&str>) -> String {
    match message {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Yes/No prompt for a found update; button 0 accepts
pub fn update_available() -> Notice {
    Notice::new("Updates Found", "New version available. Update the app now?")
        .with_kind(NoticeKind::Info)
        .with_buttons(["Yes", "No"])
}

pub fn update_downloaded() -> Notice {
    Notice::new(
        "Install Updates",
        "Updates downloaded. Application will quit now...",
    )
    .with_buttons(["Install and Relaunch"])
}

pub fn up_to_date() -> Notice {
    Notice::new("No Updates Found", "You have the latest version installed.").with_buttons(["Close"])
}
