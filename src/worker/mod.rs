//! End-to-end summary flow and delivery into the user's document

pub mod deliver;
pub mod summarize;

pub use deliver::{DigestNote, insert_note, render_note};
pub use summarize::{RunOptions, SummaryOutcome, summarize_window};

/// Shown when summarization fails and no more specific notice applies.
pub const CANONICAL_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't generate a summary at this time. Please try again later.";
