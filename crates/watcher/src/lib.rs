//! Change detection and debounced commit scheduling
//!
//! This crate provides:
//! - Prefix-based ignore rules per project
//! - The per-project watch session state machine (debounce, size gate, retry)
//! - A native filesystem event source feeding sessions

pub mod ignore;
pub mod session;
pub mod source;

// Re-exports
pub use ignore::IgnoreRules;
pub use session::{tracked_size, CycleOutcome, SessionState, WatchSession};
pub use source::{ChangeEvent, ChangeSink, ChangeSource, NotifySource, SourceFault};
