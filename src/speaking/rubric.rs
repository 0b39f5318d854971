#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Rubric definitions. A rubric maps each discrete score level to the
//! descriptive text graders (and the evaluating model) score against.

use itertools::Itertools;

use super::{TaskKind, TaskNumber};

/// One score band of a rubric.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricBand {
    /// Discrete score level, one of `0.0..=4.0` in whole steps.
    pub level:       f64,
    /// Criteria a response must meet to earn this level.
    pub description: String,
}

/// An immutable, ordered mapping from score level to description.
///
/// Rubrics are defined at configuration time and never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Rubric {
    /// Bands in descending level order, as rendered into prompts.
    bands: Vec<RubricBand>,
}

impl Rubric {
    /// Parses a rubric asset where each line reads `level: description`.
    ///
    /// Only called on assets embedded at compile time, so a malformed line is
    /// a programmer error rather than a runtime condition.
    pub(crate) fn from_asset(asset: &str) -> Self {
        let bands = asset
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (level, description) = line
                    .split_once(": ")
                    .expect("rubric asset line must read `level: description`");
                RubricBand {
                    level:       level
                        .trim()
                        .parse::<f64>()
                        .expect("rubric asset level must be numeric"),
                    description: description.trim().to_string(),
                }
            })
            .collect();
        Self { bands }
    }

    /// Returns the bands in descending level order.
    pub fn bands(&self) -> &[RubricBand] {
        &self.bands
    }

    /// Renders the rubric as `level: description` lines for prompt embedding.
    pub fn render(&self) -> String {
        self.bands
            .iter()
            .map(|band| format!("{:.1}: {}", band.level, band.description))
            .join("\n")
    }
}

/// The built-in rubric catalog: language use for every task, plus the
/// independent and integrated topic-development variants.
#[derive(Clone)]
pub struct RubricCatalog {
    /// Language-use rubric, shared by all four tasks.
    language_use:                  Rubric,
    /// Topic-development rubric for the independent task.
    topic_development_independent: Rubric,
    /// Topic-development rubric for integrated tasks.
    topic_development_integrated:  Rubric,
}

impl RubricCatalog {
    /// Loads the rubric texts embedded in the binary.
    pub fn load() -> Self {
        Self {
            language_use:                  Rubric::from_asset(include_str!(
                "prompts/language_use.md"
            )),
            topic_development_independent: Rubric::from_asset(include_str!(
                "prompts/topic_development_independent.md"
            )),
            topic_development_integrated:  Rubric::from_asset(include_str!(
                "prompts/topic_development_integrated.md"
            )),
        }
    }

    /// Returns the language-use rubric.
    pub fn language_use(&self) -> &Rubric {
        &self.language_use
    }

    /// Returns the topic-development rubric for the given task. The variant
    /// is a fixed dispatch on task kind, never a runtime decision by content.
    pub fn topic_development(&self, task: TaskNumber) -> &Rubric {
        match task.kind() {
            TaskKind::Independent => &self.topic_development_independent,
            TaskKind::Integrated => &self.topic_development_integrated,
        }
    }
}
