//! State module for tracking enrichment progress
//!
//! # Components
//!
//! - `BookmarkStatus`: pending / failed / completed, derived from a bookmark record
//! - `EnrichmentAttempt`: the ephemeral unit of work handled by the retry scheduler
//! - `AttemptState`: the retry scheduler's state machine

mod attempt;
mod bookmark_state;

// Re-export main types
pub use attempt::{AttemptState, EnrichmentAttempt};
pub use bookmark_state::BookmarkStatus;
