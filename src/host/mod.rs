//! Narrow host-application interfaces.
//!
//! The core never talks to the OS directly; these two traits are the whole
//! surface:
//!
//! * [`KeyPresser`] — deliver a key-descriptor sequence to the focused
//!   window (the same descriptors the tracker replays locally).
//! * [`FocusedTextReader`] — read the focused text field's content for a
//!   resync, best-effort.
//!
//! Production implementations are [`EnigoPresser`] (key simulation) and
//! [`ClipboardReader`] (select-all/copy/restore with bounded settle
//! delays).  Both are deliberately dumb: all intelligence lives in the
//! core, which treats every host answer as possibly stale.

pub mod presser;
pub mod reader;

pub use presser::{EnigoPresser, KeyPresser, RecordingPresser};
pub use reader::{ClipboardReader, FocusedTextReader, HostText, StaticReader};

use thiserror::Error;

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// All errors that can surface from host interaction.
#[derive(Debug, Error)]
pub enum HostError {
    /// Could not open or read the system clipboard.
    #[error("cannot access clipboard: {0}")]
    ClipboardAccess(String),

    /// Could not write text to the system clipboard.
    #[error("cannot set clipboard text: {0}")]
    ClipboardSet(String),

    /// Could not simulate a key press/release event.
    #[error("cannot simulate key press: {0}")]
    KeySimulation(String),

    /// The descriptor batch could not be parsed.
    #[error("invalid key descriptor: {0}")]
    Descriptor(#[from] crate::keys::KeyParseError),
}
