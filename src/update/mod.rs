//! Update session module
//!
//! This module provides:
//! - The update engine seam (`UpdateEngine`, lifecycle events, `EventBus`)
//! - The update session controller driving the progress surface and taskbar
//! - Session state and user-facing copy

pub mod controller;
pub mod engine;
pub mod prompts;
pub mod state;


pub use controller::{SessionCollaborators, UpdateSessionController};
pub use engine::{
    DownloadProgress, EventBus, EventHandler, UpdateEngine, UpdateEvent, UpdateEventKind,
};
pub use prompts::ProgressFlow;
pub use state::{UpdateSession, UpdateState};
