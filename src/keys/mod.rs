//! Key-event descriptor grammar.
//!
//! Every movement the front-end issues (or replays) is described by a compact
//! text descriptor, space-separated when batched:
//!
//! ```text
//! left right:3 shift-left ctrl-right:2 shift:down right:9 shift:up
//! ```
//!
//! Two forms exist:
//!
//! * `mod1-mod2-…-key[:count]` — a key press with optional held modifiers and
//!   a positive repeat count (`left`, `shift-right:4`, `ctrl-a`).
//! * `modifier:(up|down)` — press or release a modifier on its own
//!   (`shift:down`), used when a selection spans several following presses.
//!
//! Unrecognised key names parse successfully into [`KeyTarget::Other`] — the
//! caret tracker treats those as desynchronizing, which is a state, not an
//! error.  Only a structurally malformed descriptor (bad repeat count, empty
//! token) is a [`KeyParseError`].

pub mod descriptor;

pub use descriptor::{
    parse_descriptor, parse_descriptors, KeyEvent, KeyParseError, KeyPress, KeyTarget, Modifier,
};
