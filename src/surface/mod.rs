//! Display surface layer
//!
//! The windowing layer is an external collaborator. This module defines the
//! seams the update session needs from it:
//! - `OwnerWindow`: the main window (taskbar indicator + message channels)
//! - `SurfaceFactory` / `SurfaceHandle`: secondary surface lifecycle
//! - `ProgressSurfaceManager`: the single progress surface slot

mod progress;


pub use progress::{
    ProgressMode, ProgressPayload, ProgressSurfaceManager, ShowOutcome, SurfaceReadiness,
    PROGRESS_CHANNEL,
};

use std::sync::Arc;

use crate::config::SurfaceOptions;
use crate::core::error::{ChannelError, SurfaceError};

/// One-shot callback fired on a surface lifecycle signal
pub type LifecycleCallback = Box<dyn FnOnce() + Send>;

/// Handler for inbound messages on an owner window channel
pub type MessageHandler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// The main application window that owns secondary surfaces
pub trait OwnerWindow: Send + Sync {
    /// Set the taskbar progress indicator (`-1` hides, `0..=1` fraction, `>1` indeterminate)
    fn set_progress_bar(&self, value: f64);

    /// Post a message to the window's content
    fn send(&self, channel: &str, payload: serde_json::Value) -> Result<(), ChannelError>;

    /// Register a listener for messages the window's content posts back
    fn on_message(&self, channel: &str, handler: MessageHandler) -> Result<(), ChannelError>;
}

/// A live secondary surface
pub trait SurfaceHandle: Send + Sync {
    /// Load a view route into the surface
    fn load_view(&self, route: &str) -> Result<(), SurfaceError>;

    /// Register a callback fired once the surface is closed, by the user or programmatically
    fn on_closed(&self, callback: LifecycleCallback);

    /// Register a callback fired once, the first time the surface can receive messages
    fn once_ready(&self, callback: LifecycleCallback);

    /// Post a message to the surface's content
    fn send(&self, channel: &str, payload: serde_json::Value) -> Result<(), ChannelError>;

    /// Bring the surface to the front
    fn focus(&self);

    /// Close the surface
    fn close(&self);
}

/// Creates secondary surfaces parented to an owner window
pub trait SurfaceFactory: Send + Sync {
    fn create(
        &self,
        options: &SurfaceOptions,
        owner: &Arc<dyn OwnerWindow>,
    ) -> Result<Arc<dyn SurfaceHandle>, SurfaceError>;
}
