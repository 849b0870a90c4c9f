//! voice-caret — caret tracking and phonetic phrase matching for voice
//! dictation.
//!
//! A dictation front-end only sees two signals from the host application:
//! the key presses it issued itself, and (sometimes) the text near the
//! caret read back through accessibility APIs.  This crate infers and
//! maintains the caret position from those signals and answers fuzzy
//! "where is this spoken phrase" queries over the dictated text, so a user
//! can navigate, select and correct by voice alone.
//!
//! # Layers, leaves first
//!
//! * [`keys`] — the key-event descriptor grammar shared by the tracker and
//!   the host presser.
//! * [`phonetics`] — word-to-word similarity scoring over mutable
//!   homophone/similarity tables.
//! * [`caret`] — the marker buffer and the key-replay caret tracker.
//! * [`tokens`] — the token buffer with insert/merge/split/delete
//!   semantics and reindexing.
//! * [`matcher`] — windowed branch-and-bound phrase alignment for
//!   selection, correction and self-repair.
//! * [`context`] — one buffer per host window, resync policy, and the
//!   voice-action entry points.
//! * [`host`] — the narrow traits behind which the OS lives.
//! * [`config`] — settings and platform paths.
//!
//! # Quick start
//!
//! ```rust
//! use voice_caret::context::ContextManager;
//!
//! let mut mgr = ContextManager::default();
//! mgr.insert_text("Insert a new sentence.");
//!
//! let words = vec!["insert".to_string(), "a".to_string()];
//! let plan = mgr.select_phrases(&words).expect("phrase is present");
//! // The plan is what the host must press; the local tracker already
//! // replayed it.
//! assert_eq!(plan.to_string(), "left:22 shift:down right:9 shift:up");
//! ```

pub mod caret;
pub mod config;
pub mod context;
pub mod host;
pub mod keys;
pub mod matcher;
pub mod phonetics;
pub mod tokens;
