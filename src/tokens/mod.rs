//! Token buffer — the dictated text as an ordered token sequence.
//!
//! Inserted text folds incrementally into tokens with merge/split semantics
//! ([`InsertStrategy`]); deletions cascade and re-merge cut edges; the
//! derived per-token position fields are maintained by an idempotent
//! reindexing pass.  The sequence concatenates back to exactly the caret
//! tracker's text at all times.

pub mod buffer;
pub mod token;

pub use buffer::{determine_insert_strategy, InsertStrategy, TokenBuffer};
pub use token::{detect_format, normalize_phrase, text_to_tokens, FormatTag, Token};
