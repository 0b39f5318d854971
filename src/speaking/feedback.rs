#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Extraction of structured fields from raw evaluation feedback.
//!
//! The feedback format is a small grammar of bolded labels: two score fields
//! holding a `digit.digit` value and a revised-text field extending to the
//! end of the document. Each field is located independently so one parse
//! attempt reports every missing field, not just the first.

use std::{fmt, sync::OnceLock};

use regex::Regex;

/// Label preceding the language-use score.
const LANGUAGE_USE_LABEL: &str = "**Score for Language Use:**";
/// Label preceding the topic-development score.
const TOPIC_DEVELOPMENT_LABEL: &str = "**Score for Topic Development:**";
/// Label preceding the revised text, which runs to end of document.
const REVISED_LABEL: &str = "**Revised Version:**";

/// The labeled fields a feedback document may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackField {
    /// `**Score for Language Use:**`, always required.
    LanguageUse,
    /// `**Score for Topic Development:**`, required iff the originating
    /// request used a topic-development rubric.
    TopicDevelopment,
    /// `**Revised Version:**`, always required.
    Revision,
}

impl fmt::Display for FeedbackField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackField::LanguageUse => write!(f, "score for language use"),
            FeedbackField::TopicDevelopment => write!(f, "score for topic development"),
            FeedbackField::Revision => write!(f, "revised version"),
        }
    }
}

/// Error describing every expected field the feedback failed to provide.
///
/// The affected record is discarded; scores are never defaulted to zero
/// because a zero would silently corrupt the raw-score sum downstream.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("feedback missing {}", list_fields(.missing))]
pub struct ParseError {
    /// All expected fields that could not be located.
    pub missing: Vec<FeedbackField>,
}

impl ParseError {
    /// Returns whether the given field is among the missing ones.
    pub fn is_missing(&self, field: FeedbackField) -> bool {
        self.missing.contains(&field)
    }
}

/// Renders a comma-separated list of field names for error messages.
fn list_fields(fields: &[FeedbackField]) -> String {
    fields
        .iter()
        .map(FeedbackField::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Structured fields extracted from one feedback document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeedback {
    /// Language-use score in `[0.0, 4.0]`.
    pub language_use_score:      f64,
    /// Topic-development score in `[0.0, 4.0]`, absent when the originating
    /// request carried no topic-development rubric.
    pub topic_development_score: Option<f64>,
    /// The evaluator's corrected version of the response.
    pub revised_text:            String,
    /// The student's original response, carried through for diffing.
    pub original_text:           String,
}

impl ParsedFeedback {
    /// Overall score for the task: the mean of both scores when
    /// topic development is present, else the language-use score alone.
    pub fn overall_score(&self) -> f64 {
        match self.topic_development_score {
            Some(topic_development) => (self.language_use_score + topic_development) / 2.0,
            None => self.language_use_score,
        }
    }
}

/// Pattern matching a score token: a single digit, a literal decimal point,
/// a single digit. Scores are not assumed integral.
fn score_token() -> &'static Regex {
    static SCORE_TOKEN: OnceLock<Regex> = OnceLock::new();
    SCORE_TOKEN.get_or_init(|| Regex::new(r"\A\s*(\d\.\d)").expect("score token pattern"))
}

/// Locates `label` in `raw` and parses the score token that follows it.
fn score_after(raw: &str, label: &str) -> Option<f64> {
    let rest = &raw[raw.find(label)? + label.len()..];
    score_token()
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .and_then(|token| token.as_str().parse::<f64>().ok())
}

/// Locates the revised-version label and captures everything after it through
/// end of document, trimmed of surrounding whitespace.
fn revision_after(raw: &str) -> Option<String> {
    let rest = &raw[raw.find(REVISED_LABEL)? + REVISED_LABEL.len()..];
    Some(rest.trim().to_string())
}

/// Parses one raw feedback document into its structured fields.
///
/// All three lookups run regardless of earlier failures; the error carries
/// the complete set of missing fields. When `expect_topic_development` is
/// false the topic-development field is optional and its absence is not an
/// error. Pure and deterministic: identical input yields identical output.
pub fn parse(
    raw: &str,
    original_text: &str,
    expect_topic_development: bool,
) -> Result<ParsedFeedback, ParseError> {
    let language_use = score_after(raw, LANGUAGE_USE_LABEL);
    let topic_development = score_after(raw, TOPIC_DEVELOPMENT_LABEL);
    let revision = revision_after(raw);

    let mut missing = Vec::new();
    if language_use.is_none() {
        missing.push(FeedbackField::LanguageUse);
    }
    if expect_topic_development && topic_development.is_none() {
        missing.push(FeedbackField::TopicDevelopment);
    }
    if revision.is_none() {
        missing.push(FeedbackField::Revision);
    }
    if !missing.is_empty() {
        return Err(ParseError { missing });
    }

    Ok(ParsedFeedback {
        // Guarded by the presence checks above.
        language_use_score:      language_use.expect("language use score present"),
        topic_development_score: topic_development,
        revised_text:            revision.expect("revised text present"),
        original_text:           original_text.to_string(),
    })
}
