#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Domain types and pipeline stages for grading speaking tasks.
//!
//! The pipeline is file-driven: `batch` evaluates one task's transcripts and
//! persists raw feedback to `task{N}_responses.json`; `report` consumes that
//! file to produce tables, diffs, and the cross-task roster.

/// Batch evaluation of one task's student transcripts
pub mod batch;
/// Word-level diff rendering between original and revised transcripts
pub mod diff;
/// Rubric-based evaluation via an external chat-completion service
pub mod evaluate;
/// Extraction of scores and revised text from raw feedback
pub mod feedback;
/// Tabular, HTML, and markdown outputs
pub mod report;
/// Rubric definitions and the built-in rubric catalog
pub mod rubric;
/// Score aggregation and the raw-to-scaled conversion table
pub mod score;

use std::{fmt, path::PathBuf, str::FromStr};

pub use batch::{TaskAssets, evaluate_task};
pub use diff::render_diff;
pub use evaluate::{EvaluationRequest, RubricEvaluator, TranscriptEvaluator};
pub use feedback::{FeedbackField, ParseError, ParsedFeedback};
pub use rubric::{Rubric, RubricCatalog};
pub use score::{StudentTotal, aggregate, convert_raw_to_toefl};

/// Whether a task stands alone or responds to provided material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Task 1: the student speaks from personal experience.
    Independent,
    /// Tasks 2-4: the student responds to reading and/or listening stimuli.
    Integrated,
}

/// A validated speaking-task number in `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskNumber(u8);

/// Error produced when a task number outside `1..=4` is supplied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("task number must be 1, 2, 3, or 4, got `{0}`")]
pub struct InvalidTaskNumber(pub String);

impl TaskNumber {
    /// All four speaking tasks, in order.
    pub const ALL: [TaskNumber; 4] =
        [TaskNumber(1), TaskNumber(2), TaskNumber(3), TaskNumber(4)];

    /// Builds a task number, rejecting anything outside `1..=4`.
    pub fn new(n: u8) -> Result<Self, InvalidTaskNumber> {
        if (1..=4).contains(&n) {
            Ok(Self(n))
        } else {
            Err(InvalidTaskNumber(n.to_string()))
        }
    }

    /// Returns the task number as a plain integer.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Returns whether this task is independent or integrated.
    pub fn kind(self) -> TaskKind {
        if self.0 == 1 {
            TaskKind::Independent
        } else {
            TaskKind::Integrated
        }
    }

    /// Tasks 2 and 3 come with a reading passage transcript.
    pub fn has_reading(self) -> bool {
        matches!(self.0, 2 | 3)
    }

    /// Tasks 2, 3, and 4 come with a listening passage transcript.
    pub fn has_listening(self) -> bool {
        matches!(self.0, 2 | 3 | 4)
    }

    /// `task{N}_question.txt`
    pub fn question_file(self) -> PathBuf {
        PathBuf::from(format!("task{}_question.txt", self.0))
    }

    /// `task{N}_reading.txt`
    pub fn reading_file(self) -> PathBuf {
        PathBuf::from(format!("task{}_reading.txt", self.0))
    }

    /// `task{N}_listening.txt`
    pub fn listening_file(self) -> PathBuf {
        PathBuf::from(format!("task{}_listening.txt", self.0))
    }

    /// Directory holding per-student transcripts for this task.
    pub fn transcript_dir(self) -> PathBuf {
        PathBuf::from(format!("task{}_txt", self.0))
    }

    /// Glob pattern matching this task's transcripts inside
    /// [`TaskNumber::transcript_dir`].
    pub fn transcript_pattern(self) -> String {
        format!("*_task{}.txt", self.0)
    }

    /// `task{N}_responses.json`, the hand-off file between evaluation and
    /// every downstream consumer.
    pub fn responses_file(self) -> PathBuf {
        PathBuf::from(format!("task{}_responses.json", self.0))
    }
}

impl fmt::Display for TaskNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskNumber {
    type Err = InvalidTaskNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| InvalidTaskNumber(s.trim().to_string()))
            .and_then(TaskNumber::new)
    }
}
