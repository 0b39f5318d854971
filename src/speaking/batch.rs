#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Batch evaluation of one task's student transcripts.
//!
//! Each student's transcript is evaluated in its own future, bounded by a
//! semaphore to respect the service's rate limits; results merge at a single
//! collection point keyed by student id, so ordering across students never
//! matters. The raw feedback is persisted to `task{N}_responses.json`, the
//! stable hand-off format consumed by every downstream stage.

use std::{collections::BTreeMap, fmt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::{
    TaskNumber,
    evaluate::{EvaluationRequest, RubricEvaluator},
    rubric::RubricCatalog,
};
use crate::util::{find_transcripts, write_atomic};

/// One student's entry in the responses file. The field names are a de facto
/// wire contract shared with older tooling; do not rename them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    /// The transcript as submitted, trimmed.
    pub original_response: String,
    /// The evaluator's raw, unparsed feedback text.
    pub feedback:          String,
}

/// Task-level input files: the question plus optional stimulus transcripts.
#[derive(Debug, Clone)]
pub struct TaskAssets {
    /// The question posed to the student.
    pub question:  String,
    /// Reading passage, tasks 2-3, when the file exists.
    pub reading:   Option<String>,
    /// Listening passage, tasks 2-4, when the file exists.
    pub listening: Option<String>,
}

impl TaskAssets {
    /// Loads the task's input files from `root`.
    ///
    /// The question file is required; a missing question fails the task (and
    /// only the task). Reading and listening transcripts are picked up when
    /// the task calls for them and the file exists.
    pub fn load(root: &Path, task: TaskNumber) -> Result<Self> {
        let question_path = root.join(task.question_file());
        let question = std::fs::read_to_string(&question_path)
            .with_context(|| format!("Could not read {}", question_path.display()))?
            .trim()
            .to_string();

        let reading = if task.has_reading() {
            read_optional(&root.join(task.reading_file()))
        } else {
            None
        };
        let listening = if task.has_listening() {
            read_optional(&root.join(task.listening_file()))
        } else {
            None
        };

        Ok(Self {
            question,
            reading,
            listening,
        })
    }
}

/// Reads a stimulus file if present, returning `None` when it is absent.
fn read_optional(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|text| text.trim().to_string())
}

/// Outcome of evaluating one task's batch of transcripts.
#[derive(Debug, Clone)]
pub struct TaskSummary {
    /// The task that was evaluated.
    pub task:      TaskNumber,
    /// Students whose feedback was produced and persisted.
    pub evaluated: Vec<String>,
    /// Students skipped, with the reason for each skip.
    pub skipped:   Vec<(String, String)>,
}

impl fmt::Display for TaskSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Task {}: {} evaluated, {} skipped",
            self.task,
            self.evaluated.len(),
            self.skipped.len()
        )?;
        for (student, reason) in &self.skipped {
            writeln!(f, "  skipped {student}: {reason}")?;
        }
        Ok(())
    }
}

/// Evaluates every transcript for `task` found under `root` and writes
/// `task{N}_responses.json`.
///
/// One bad transcript never aborts the batch: service failures are recorded
/// in the summary and the student is left out of the responses file. The
/// output is fully materialized in memory and published atomically so a
/// crash mid-batch cannot corrupt the hand-off file.
pub async fn evaluate_task(
    root: &Path,
    task: TaskNumber,
    evaluator: &RubricEvaluator,
    catalog: &RubricCatalog,
    concurrency: usize,
) -> Result<TaskSummary> {
    let assets = TaskAssets::load(root, task)?;

    let transcript_dir = root.join(task.transcript_dir());
    let transcripts = find_transcripts(&transcript_dir, &task.transcript_pattern())?;
    if transcripts.is_empty() {
        bail!(
            "No student files found in {}. Please check the directory.",
            transcript_dir.display()
        );
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let evaluations = transcripts.into_iter().map(|path| {
        let semaphore = Arc::clone(&semaphore);
        let assets = assets.clone();
        let student = student_id(&path);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");

            let response = match std::fs::read_to_string(&path) {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    return (student, Err(anyhow::anyhow!("could not read transcript: {e}")));
                }
            };

            tracing::info!("Evaluating response for student: {student}");
            let request = EvaluationRequest::builder()
                .question(assets.question.clone())
                .student_response(response.clone())
                .language_use_rubric(catalog.language_use().clone())
                .topic_development_rubric(catalog.topic_development(task).clone())
                .maybe_reading_transcript(assets.reading.clone())
                .maybe_listening_transcript(assets.listening.clone())
                .build();

            let feedback = evaluator.evaluate(&request).await.map(|feedback| {
                StudentRecord {
                    original_response: response,
                    feedback,
                }
            });
            (student, feedback)
        }
    });

    let mut records: BTreeMap<String, StudentRecord> = BTreeMap::new();
    let mut skipped = Vec::new();
    for (student, outcome) in join_all(evaluations).await {
        match outcome {
            Ok(record) => {
                records.insert(student, record);
            }
            Err(e) => {
                tracing::warn!("Skipping {student}: {e:#}");
                skipped.push((student, format!("{e:#}")));
            }
        }
    }

    save_responses(root, task, &records)?;

    Ok(TaskSummary {
        task,
        evaluated: records.into_keys().collect(),
        skipped,
    })
}

/// Derives the student identifier from a transcript file name: the stem up
/// to the first underscore (`amelia_w3_task2.txt` -> `amelia`).
fn student_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    stem.split('_').next().unwrap_or(stem).to_string()
}

/// Writes the responses file for `task`, atomically.
pub fn save_responses(
    root: &Path,
    task: TaskNumber,
    records: &BTreeMap<String, StudentRecord>,
) -> Result<()> {
    let path = root.join(task.responses_file());
    let json = serde_json::to_string_pretty(records)
        .context("Could not serialize student responses")?;
    write_atomic(&path, json.as_bytes())
}

/// Loads the responses file for `task`.
pub fn load_responses(
    root: &Path,
    task: TaskNumber,
) -> Result<BTreeMap<String, StudentRecord>> {
    let path = root.join(task.responses_file());
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Could not parse {}", path.display()))
}
