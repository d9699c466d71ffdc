//! Configuration for the update session
//!
//! Provides:
//! - Engine settings (background download, unpackaged config override)
//! - Progress surface window options
//! - Connectivity probe and activity handshake timeouts
//! - JSON file load/save

mod storage;

pub use storage::{
    ConfigError, ConfigResult, ConnectivityConfig, SurfaceOptions, UpdaterConfig,
};
