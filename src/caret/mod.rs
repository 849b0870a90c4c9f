//! Caret tracking over an externally-edited text field.
//!
//! The host application owns the real caret; this module maintains a
//! best-effort mirror of it by replaying the key events the front-end
//! itself issues.  Knowledge degrades rather than errors: the tracker moves
//! between exact, line-only (coarse) and unknown positions, and the empty
//! buffer is the canonical "I know nothing" state.

pub mod buffer;
pub mod tracker;

pub use buffer::{
    CaretState, MarkerBuffer, MarkerKind, SelectionAnchor, CARET_MARKER, COARSE_MARKER,
};
pub use tracker::CaretTracker;
