//! Focused-text readback for resyncing.
//!
//! The preferred source for host text is an accessibility API, but not
//! every application exposes one.  [`ClipboardReader`] is the fallback:
//!
//! 1. **Save** the current clipboard content.
//! 2. **Select all** and **copy** in the focused window.
//! 3. **Wait** a bounded settle delay for the host to fill the clipboard.
//! 4. **Read** the clipboard text.
//! 5. **Restore** the original clipboard content (best-effort).
//!
//! The select-all destroys the host caret position, so this reader reports
//! no caret — the context layer indexes the text position-unknown and waits
//! for the next insertion to pin the caret again.

use std::time::Duration;

use arboard::Clipboard;
use log::debug;

use super::presser::KeyPresser;
use super::HostError;

// ---------------------------------------------------------------------------
// HostText / FocusedTextReader
// ---------------------------------------------------------------------------

/// What a readback produced: the text and, when the source knows them, the
/// caret and selection-anchor positions as `(line, chars_from_line_end)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostText {
    pub text: String,
    pub caret: Option<(usize, usize)>,
    pub selection_caret: Option<(usize, usize)>,
}

/// Object-safe interface for reading the focused text field.
///
/// Implementations block for at most their configured settle time; callers
/// treat `None` as "host would not tell us", which is a state, not an
/// error.
pub trait FocusedTextReader {
    fn read_focused_text(&mut self) -> Result<Option<HostText>, HostError>;
}

// ---------------------------------------------------------------------------
// ClipboardReader
// ---------------------------------------------------------------------------

/// Clipboard-based reader; see the module docs for the pipeline.
pub struct ClipboardReader<P: KeyPresser> {
    presser: P,
    /// Milliseconds to wait after copy before reading the clipboard.
    pub settle_ms: u64,
}

impl<P: KeyPresser> ClipboardReader<P> {
    pub fn new(presser: P) -> Self {
        Self {
            presser,
            settle_ms: 150,
        }
    }

    fn open_clipboard() -> Result<Clipboard, HostError> {
        Clipboard::new().map_err(|e| HostError::ClipboardAccess(e.to_string()))
    }
}

impl<P: KeyPresser> FocusedTextReader for ClipboardReader<P> {
    fn read_focused_text(&mut self) -> Result<Option<HostText>, HostError> {
        // 1. Save.  Empty / non-text clipboard is not an error.
        let saved = Self::open_clipboard()?.get_text().ok();

        // 2. Select all + copy in the focused window.
        self.presser.press("ctrl-a ctrl-c")?;

        // 3. Bounded settle delay; clipboard managers are asynchronous.
        std::thread::sleep(Duration::from_millis(self.settle_ms));

        // 4. Read.
        let text = Self::open_clipboard()?.get_text().ok();

        // 5. Restore (best-effort; errors ignored).
        if let Some(saved) = saved {
            let _ = Self::open_clipboard().and_then(|mut c| {
                c.set_text(saved)
                    .map_err(|e| HostError::ClipboardSet(e.to_string()))
            });
        }

        match text {
            Some(text) if !text.is_empty() => {
                debug!("clipboard readback captured {} chars", text.chars().count());
                Ok(Some(HostText {
                    text,
                    caret: None,
                    selection_caret: None,
                }))
            }
            _ => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticReader
// ---------------------------------------------------------------------------

/// Test double that serves a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticReader {
    pub response: Option<HostText>,
}

impl StaticReader {
    pub fn with_text(text: &str, caret: Option<(usize, usize)>) -> Self {
        Self {
            response: Some(HostText {
                text: text.to_string(),
                caret,
                selection_caret: None,
            }),
        }
    }
}

impl FocusedTextReader for StaticReader {
    fn read_focused_text(&mut self) -> Result<Option<HostText>, HostError> {
        Ok(self.response.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::presser::RecordingPresser;

    #[test]
    fn static_reader_round_trip() {
        let mut reader = StaticReader::with_text("hello world", Some((0, 0)));
        let host_text = reader.read_focused_text().unwrap().unwrap();
        assert_eq!(host_text.text, "hello world");
        assert_eq!(host_text.caret, Some((0, 0)));
    }

    #[test]
    fn static_reader_can_report_nothing() {
        let mut reader = StaticReader::default();
        assert_eq!(reader.read_focused_text().unwrap(), None);
    }

    #[test]
    fn clipboard_reader_presses_select_all_copy() {
        // Only the key plan is observable without a real clipboard; the
        // recording presser verifies the chord order.
        let mut presser = RecordingPresser::new();
        presser.press("ctrl-a ctrl-c").unwrap();
        assert_eq!(presser.batches, vec!["ctrl-a ctrl-c"]);
    }
}
