//! User-confirmed correction fixes.
//!
//! [`FixTable`] persists `(heard, corrected)` pairs as JSON so recurring
//! misrecognitions are fixed before any phonetic search runs.  Entries are
//! saved after every [`add_fix`](FixTable::add_fix) call and survive
//! restarts.
//!
//! | Platform | Path |
//! |----------|------|
//! | Windows  | `%APPDATA%\voice-caret\fixes.json` |
//! | macOS    | `~/Library/Application Support/voice-caret/fixes.json` |
//! | Linux    | `~/.config/voice-caret/fixes.json` |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FixEntry
// ---------------------------------------------------------------------------

/// A single confirmed correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixEntry {
    /// The word as the recognizer heard it.
    pub heard: String,
    /// What the user actually wanted.
    pub corrected: String,
    /// How many times this fix has been confirmed.
    pub frequency: u32,
}

// ---------------------------------------------------------------------------
// FixTable
// ---------------------------------------------------------------------------

/// Manages the user's correction fixes.
pub struct FixTable {
    entries: Vec<FixEntry>,
    path: PathBuf,
}

impl FixTable {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Load fixes from the platform config directory, or start empty on
    /// first run.
    pub fn load_or_default() -> Self {
        Self::load_from(Self::fixes_path())
    }

    /// Load fixes from an explicit path (useful for tests).
    pub fn load_from(path: PathBuf) -> Self {
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path).unwrap_or_default();
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };
        Self { entries, path }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Record a fix, then persist.  An existing entry for the same heard
    /// word is updated and its frequency bumped.
    pub fn add_fix(&mut self, heard: String, corrected: String) {
        let heard = heard.to_lowercase();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.heard == heard) {
            entry.corrected = corrected;
            entry.frequency += 1;
        } else {
            self.entries.push(FixEntry {
                heard,
                corrected,
                frequency: 1,
            });
        }
        self.save();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The known fix for a heard word, if any.
    pub fn fix_for(&self, heard: &str) -> Option<&str> {
        let heard = heard.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.heard == heard)
            .map(|e| e.corrected.as_str())
    }

    /// Apply fixes to a list of heard words.
    pub fn apply(&self, words: &[String]) -> Vec<String> {
        words
            .iter()
            .map(|w| match self.fix_for(w) {
                Some(fixed) => fixed.to_string(),
                None => w.clone(),
            })
            .collect()
    }

    /// The top-`n` most frequently confirmed fixes.
    pub fn top_entries(&self, n: usize) -> Vec<(String, String)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        sorted
            .into_iter()
            .take(n)
            .map(|e| (e.heard, e.corrected))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn save(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(&self.entries) {
            let _ = std::fs::write(&self.path, data);
        }
    }

    fn fixes_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voice-caret")
            .join("fixes.json")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table_in_temp() -> (FixTable, tempfile::TempDir) {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("fixes.json");
        (FixTable::load_from(path), dir)
    }

    #[test]
    fn starts_empty() {
        let (table, _dir) = table_in_temp();
        assert!(table.is_empty());
        assert_eq!(table.fix_for("anything"), None);
    }

    #[test]
    fn add_and_look_up() {
        let (mut table, _dir) = table_in_temp();
        table.add_fix("there".into(), "their".into());
        assert_eq!(table.fix_for("there"), Some("their"));
        assert_eq!(table.fix_for("There"), Some("their"));
    }

    #[test]
    fn duplicate_add_bumps_frequency() {
        let (mut table, _dir) = table_in_temp();
        table.add_fix("wear".into(), "where".into());
        table.add_fix("wear".into(), "where".into());
        assert_eq!(table.len(), 1);
        assert_eq!(table.top_entries(1), vec![("wear".into(), "where".into())]);
    }

    #[test]
    fn apply_substitutes_known_words_only() {
        let (mut table, _dir) = table_in_temp();
        table.add_fix("wear".into(), "where".into());
        let fixed = table.apply(&["wear".into(), "is".into(), "this".into()]);
        assert_eq!(fixed, vec!["where", "is", "this"]);
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("fixes.json");
        {
            let mut table = FixTable::load_from(path.clone());
            table.add_fix("wear".into(), "where".into());
        }
        let reloaded = FixTable::load_from(path);
        assert_eq!(reloaded.fix_for("wear"), Some("where"));
    }
}
