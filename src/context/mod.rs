//! Context management — the orchestration layer above the core.
//!
//! One buffer context per host window, resync policy, the voice-action
//! entry points (`select_phrases`, `correct_phrases`, self-repair), and the
//! user's persisted correction fixes.

pub mod fixes;
pub mod manager;

pub use fixes::{FixEntry, FixTable};
pub use manager::{ContextManager, CorrectionOutcome, NavigationPlan};
