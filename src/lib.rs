//! # viva
//!
//! A grader for TOEFL-style speaking responses. Sends student transcripts to
//! an OpenAI-compatible chat API for rubric-based evaluation, extracts scores
//! and a revised transcript from the feedback, aggregates raw totals into
//! scaled scores, and renders word-level diffs and per-task reports.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Environment-backed configuration shared across the crate
pub mod config;
/// For all things related to grading speaking tasks
pub mod speaking;
/// Utility functions for convenience
pub mod util;
