//! Configuration management for offsync.
//!
//! This module handles loading configuration from `~/.offsync/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{
    ColorSetting, Config, GeneralConfig, NetworkConfig, NetworkMode, StorageConfig, SyncConfig,
};
