//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// MatchingConfig
// ---------------------------------------------------------------------------

/// Thresholds for the phrase matcher, all on the raw `[0, 3]` score scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum weighted score for a selection match.
    pub selection_threshold: f32,
    /// Minimum weighted score for a correction match.
    pub correction_threshold: f32,
    /// Minimum weighted score for self-repair detection.  Kept high: a
    /// false positive silently rewrites text.
    pub self_repair_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            selection_threshold: crate::matcher::SELECTION_THRESHOLD,
            correction_threshold: crate::matcher::CORRECTION_THRESHOLD,
            self_repair_threshold: crate::matcher::SELF_REPAIR_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

/// Timing for host interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Milliseconds to wait after a copy before reading the clipboard
    /// during a resync.
    pub clipboard_settle_ms: u64,
    /// Milliseconds between simulated key events, for hosts that drop
    /// input under fast simulation.
    pub key_batch_delay_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            clipboard_settle_ms: 150,
            key_batch_delay_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_caret::config::AppConfig;
///
/// // Load (returns Default when the file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Matcher thresholds.
    pub matching: MatchingConfig,
    /// Host interaction timing.
    pub host: HostConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
