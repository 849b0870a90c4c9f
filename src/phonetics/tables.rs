//! Homophone / phonetic-similarity word tables.
//!
//! On disk a table is newline-separated rows, each row a comma-separated
//! cluster of mutually related words:
//!
//! ```text
//! where,wear,ware
//! to,too,two
//! ```
//!
//! Loading builds a symmetric closure map (`word → related words`); writing
//! re-serializes the whole in-memory map, one row per still-connected
//! cluster.  [`PersistentTable`] wraps a table with an optional save
//! callback — when none is supplied, additions stay in memory only (logged,
//! never fatal).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::warn;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TableError
// ---------------------------------------------------------------------------

/// Failures while loading or saving a word table file.
#[derive(Debug, Error)]
pub enum TableError {
    /// The table file could not be read.
    #[error("cannot read word table {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The table file could not be written.
    #[error("cannot write word table {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// WordTable
// ---------------------------------------------------------------------------

/// Symmetric `word → related words` map.
///
/// `BTreeMap`/`BTreeSet` keep iteration (and therefore serialization)
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Parse the comma-separated row format.  Every word in a row becomes
    /// related to every other word in that row.
    pub fn from_rows(content: &str) -> Self {
        let mut table = Self::new();
        for row in content.lines() {
            let words: Vec<String> = row
                .split(',')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            table.add_cluster(&words);
        }
        table
    }

    /// Load from a file.  A missing file yields an empty table (first run),
    /// matching the load-or-default behavior of the rest of the config
    /// surface.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_rows(&content))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Words related to `word` (empty when unknown).
    pub fn related(&self, word: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(word)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn contains_pair(&self, a: &str, b: &str) -> bool {
        self.entries.get(a).is_some_and(|set| set.contains(b))
    }

    /// Number of words with at least one relation.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Relate two words symmetrically.  Returns `false` when the pair was
    /// already present.
    pub fn add_pair(&mut self, a: &str, b: &str) -> bool {
        if a.is_empty() || b.is_empty() || a == b {
            return false;
        }
        let inserted = self
            .entries
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.entries
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        inserted
    }

    fn add_cluster(&mut self, words: &[String]) {
        for (i, a) in words.iter().enumerate() {
            for b in words.iter().skip(i + 1) {
                self.add_pair(a, b);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Serialize back to the row format: one row per connected cluster of
    /// words, alphabetical within and across rows.
    pub fn to_rows(&self) -> String {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut rows = Vec::new();

        for word in self.entries.keys() {
            if seen.contains(word.as_str()) {
                continue;
            }
            // Walk the connected cluster starting here.
            let mut cluster: BTreeSet<&str> = BTreeSet::new();
            let mut stack = vec![word.as_str()];
            while let Some(current) = stack.pop() {
                if !cluster.insert(current) {
                    continue;
                }
                for neighbor in self.related(current) {
                    if !cluster.contains(neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
            seen.extend(cluster.iter());
            rows.push(cluster.into_iter().collect::<Vec<_>>().join(","));
        }
        rows.join("\n")
    }

    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(path, self.to_rows()).map_err(|source| TableError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// PersistentTable
// ---------------------------------------------------------------------------

/// Callback invoked with the freshly serialized table after each addition.
pub type SaveCallback = Box<dyn Fn(&str) -> Result<(), TableError> + Send>;

/// A [`WordTable`] plus an optional host-provided save callback.
pub struct PersistentTable {
    table: WordTable,
    save: Option<SaveCallback>,
    label: &'static str,
}

impl PersistentTable {
    pub fn new(table: WordTable, label: &'static str) -> Self {
        Self {
            table,
            save: None,
            label,
        }
    }

    pub fn with_save_callback(mut self, save: SaveCallback) -> Self {
        self.save = Some(save);
        self
    }

    pub fn table(&self) -> &WordTable {
        &self.table
    }

    /// Add a pair and persist through the callback.  Without a callback the
    /// update stays in memory only — logged, not fatal.
    pub fn add_pair(&mut self, a: &str, b: &str) {
        if !self.table.add_pair(a, b) {
            return;
        }
        match &self.save {
            Some(save) => {
                if let Err(e) = save(&self.table.to_rows()) {
                    warn!("failed to persist {} table: {e}", self.label);
                }
            }
            None => warn!(
                "no persistence callback for {} table; pair kept in memory only",
                self.label
            ),
        }
    }
}

impl std::fmt::Debug for PersistentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentTable")
            .field("label", &self.label)
            .field("words", &self.table.len())
            .field("persisted", &self.save.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
