//! Configuration module.
//!
//! Provides `AppConfig` (matcher thresholds + host timing), `AppPaths` for
//! cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, HostConfig, MatchingConfig};
