//! Update session core
//!
//! Coordinates a background update check/download with a modal progress
//! surface and the owner window's taskbar indicator:
//! - Engine lifecycle events drive a per-process session state machine
//! - A single progress surface, buffered until it signals readiness
//! - A seek/reply handshake so taskbar progress owned by another transfer
//!   is left alone
//! - Connectivity gating before any progress flow opens

pub mod config;
pub mod connectivity;
pub mod core;
pub mod logging;
pub mod notice;
pub mod surface;
pub mod transfer;
pub mod update;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use crate::config::UpdaterConfig;
pub use crate::connectivity::{ConnectivityProbe, HttpConnectivityProbe};
pub use crate::core::error::{Result, UpdateSessionError};
pub use crate::notice::{DialogResponse, Notice, NoticePresenter};
pub use crate::surface::{OwnerWindow, ProgressPayload, ProgressSurfaceManager, SurfaceFactory};
pub use crate::transfer::{TaskbarProgress, TransferActivityRegistry};
pub use crate::update::{SessionCollaborators, UpdateEngine, UpdateEvent, UpdateSessionController};
