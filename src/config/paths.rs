//! Cross-platform application paths using the `dirs` crate.
//!
//! Everything lives in the config directory:
//!
//!   Windows: %APPDATA%\voice-caret\
//!   macOS:   ~/Library/Application Support/voice-caret/
//!   Linux:   ~/.config/voice-caret/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for settings and word tables.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to the homophone table (`homophones.csv`).
    pub homophones_file: PathBuf,
    /// Full path to the phonetic-similarity table
    /// (`phonetic_similarities.csv`).
    pub similarities_file: PathBuf,
    /// Full path to the user fix table (`fixes.json`).
    pub fixes_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-caret";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let homophones_file = config_dir.join("homophones.csv");
        let similarities_file = config_dir.join("phonetic_similarities.csv");
        let fixes_file = config_dir.join("fixes.json");

        Self {
            config_dir,
            settings_file,
            homophones_file,
            similarities_file,
            fixes_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .homophones_file
            .file_name()
            .is_some_and(|n| n == "homophones.csv"));
        assert!(paths
            .fixes_file
            .file_name()
            .is_some_and(|n| n == "fixes.json"));
    }
}
