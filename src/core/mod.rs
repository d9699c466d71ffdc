//! Core module
//!
//! Error types shared by every component of the update session.

pub mod error;

pub use error::{ChannelError, EngineError, Result, SurfaceError, UpdateSessionError};
