#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Presentation outputs: per-task feedback tables (console, CSV, HTML diff
//! document), the cross-task score roster, and the markdown study post.
//! These are deliberately simple file-format glue over the parsed records.

use std::{collections::BTreeMap, fmt, path::Path};

use anyhow::{Context, Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

use super::{
    TaskNumber,
    batch::{TaskAssets, load_responses},
    diff::render_diff,
    feedback::{self, ParsedFeedback},
    score::{StudentTotal, aggregate},
};
use crate::util::{csv_field, write_atomic};

/// One row of the per-task feedback report.
#[derive(Tabled, Clone)]
pub struct FeedbackRow {
    /// Student identifier.
    #[tabled(rename = "Student's name")]
    pub student:           String,
    /// Language-use score as rendered.
    #[tabled(rename = "Language Use")]
    pub language_use:      String,
    /// Topic-development score as rendered, `-` when absent.
    #[tabled(rename = "Topic Development")]
    pub topic_development: String,
    /// Overall score as rendered.
    #[tabled(rename = "Overall Score")]
    pub overall:           String,
    /// Original transcript; kept out of the console table.
    #[tabled(skip)]
    pub original:          String,
    /// Revised transcript; kept out of the console table.
    #[tabled(skip)]
    pub revised:           String,
}

impl FeedbackRow {
    /// Builds a row from one student's parsed feedback.
    fn new(student: &str, parsed: &ParsedFeedback) -> Self {
        Self {
            student:           student.to_string(),
            language_use:      parsed.language_use_score.to_string(),
            topic_development: parsed
                .topic_development_score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "-".to_string()),
            overall:           parsed.overall_score().to_string(),
            original:          parsed.original_text.clone(),
            revised:           parsed.revised_text.clone(),
        }
    }
}

/// Outcome of formatting one task's responses.
#[derive(Debug, Clone)]
pub struct FormatSummary {
    /// The task that was formatted.
    pub task:    TaskNumber,
    /// Students whose feedback parsed cleanly.
    pub parsed:  Vec<String>,
    /// Students skipped, with the missing fields for each.
    pub skipped: Vec<(String, String)>,
}

impl fmt::Display for FormatSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Task {}: {} parsed, {} skipped",
            self.task,
            self.parsed.len(),
            self.skipped.len()
        )?;
        for (student, reason) in &self.skipped {
            writeln!(f, "  skipped {student}: {reason}")?;
        }
        Ok(())
    }
}

/// Parses every record in `task{N}_responses.json` and writes the feedback
/// CSV and the highlighted-changes HTML document, printing a summary table.
///
/// Records whose feedback cannot be parsed are skipped and reported; they
/// are never written out with defaulted scores.
pub fn format_task(root: &Path, task: TaskNumber) -> Result<FormatSummary> {
    let records = load_responses(root, task)?;

    let mut rows: Vec<FeedbackRow> = Vec::new();
    let mut highlighted: Vec<(String, String)> = Vec::new();
    let mut skipped = Vec::new();

    for (student, record) in &records {
        match feedback::parse(&record.feedback, &record.original_response, true) {
            Ok(parsed) => {
                if !parsed.original_text.is_empty() {
                    highlighted.push((
                        student.clone(),
                        render_diff(&parsed.original_text, &parsed.revised_text),
                    ));
                }
                rows.push(FeedbackRow::new(student, &parsed));
            }
            Err(e) => {
                tracing::warn!("Failed to parse feedback for {student}: {e}");
                skipped.push((student.clone(), e.to_string()));
            }
        }
    }

    if rows.is_empty() {
        bail!("No valid responses found in {}", task.responses_file().display());
    }

    eprintln!(
        "{}",
        Table::new(&rows)
            .with(Panel::header(format!("Task {task} feedback")))
            .with(Style::modern())
    );

    write_feedback_csv(root, task, &rows)?;
    write_highlighted_html(root, task, &highlighted)?;

    Ok(FormatSummary {
        task,
        parsed: rows.into_iter().map(|row| row.student).collect(),
        skipped,
    })
}

/// Writes `StudentFeedback_Task{N}.csv`.
fn write_feedback_csv(root: &Path, task: TaskNumber, rows: &[FeedbackRow]) -> Result<()> {
    let mut csv = String::from(
        "Student's name,Language Use,Topic Development,Overall Score,Original Text,Revised Text\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(&row.student),
            csv_field(&row.language_use),
            csv_field(&row.topic_development),
            csv_field(&row.overall),
            csv_field(&row.original),
            csv_field(&row.revised),
        ));
    }

    let path = root.join(format!("StudentFeedback_Task{task}.csv"));
    write_atomic(&path, csv.as_bytes())?;
    tracing::info!("Feedback table saved to {}", path.display());
    Ok(())
}

/// Writes `HighlightedChanges_Task{N}.html`, one section per student.
fn write_highlighted_html(
    root: &Path,
    task: TaskNumber,
    highlighted: &[(String, String)],
) -> Result<()> {
    let mut html = String::from("<html><body>");
    for (student, markup) in highlighted {
        html.push_str(&format!("<h2>{student}</h2>"));
        html.push_str(&format!("<p>{markup}</p>"));
        html.push_str("<hr>");
    }
    html.push_str("</body></html>");

    let path = root.join(format!("HighlightedChanges_Task{task}.html"));
    write_atomic(&path, html.as_bytes())?;
    tracing::info!("Highlighted changes saved to {}", path.display());
    Ok(())
}

/// One row of the cross-task score roster.
#[derive(Tabled, Clone)]
pub struct RosterRow {
    /// Student identifier.
    #[tabled(rename = "Student Name")]
    pub student: String,
    /// Scaled score; blank when the raw total falls outside the conversion
    /// table's domain.
    #[tabled(rename = "TOEFL Score")]
    pub scaled:  String,
    /// Sum of per-task overall scores.
    #[tabled(rename = "Total Raw Score")]
    pub raw:     String,
}

/// Collects per-task overall scores for every task with a responses file.
///
/// A missing responses file skips that task; an unparsable record skips that
/// student for that task. Both are reported, neither aborts the roster.
pub fn collect_overall_scores(
    root: &Path,
) -> Result<BTreeMap<TaskNumber, BTreeMap<String, f64>>> {
    let mut per_task = BTreeMap::new();

    for task in TaskNumber::ALL {
        let records = match load_responses(root, task) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Skipping task {task}: {e:#}");
                continue;
            }
        };

        let mut task_scores = BTreeMap::new();
        for (student, record) in &records {
            match feedback::parse(&record.feedback, &record.original_response, true) {
                Ok(parsed) => {
                    task_scores.insert(student.clone(), parsed.overall_score());
                }
                Err(e) => {
                    tracing::warn!("Could not find both scores for student: {student} ({e})");
                }
            }
        }
        per_task.insert(task, task_scores);
    }

    if per_task.is_empty() {
        bail!("No responses files found for any task; nothing to score.");
    }

    Ok(per_task)
}

/// Aggregates every student's scores across tasks, prints the roster, and
/// writes `Student_Scores.csv`.
pub fn score_roster(root: &Path) -> Result<BTreeMap<String, StudentTotal>> {
    let per_task = collect_overall_scores(root)?;
    let totals = aggregate(&per_task);

    let rows: Vec<RosterRow> = totals
        .iter()
        .map(|(student, total)| RosterRow {
            student: student.clone(),
            scaled:  total.scaled.map(|s| s.to_string()).unwrap_or_default(),
            raw:     total.raw_total.to_string(),
        })
        .collect();

    eprintln!(
        "{}",
        Table::new(&rows)
            .with(Panel::header("Speaking scores"))
            .with(Style::modern())
    );

    let mut csv = String::from("Student Name,TOEFL Score,Total Raw Score\n");
    for row in &rows {
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_field(&row.student),
            csv_field(&row.scaled),
            csv_field(&row.raw),
        ));
    }
    let path = root.join("Student_Scores.csv");
    write_atomic(&path, csv.as_bytes())?;
    tracing::info!("Roster saved to {}", path.display());

    Ok(totals)
}

/// Writes a blog-style markdown study post for `task`, assembling the
/// question and each student's original, marked-up changes, and revision.
pub fn write_post(root: &Path, task: TaskNumber, title: Option<&str>) -> Result<()> {
    let records = load_responses(root, task)?;
    let assets = TaskAssets::load(root, task)
        .with_context(|| format!("Could not load assets for task {task}"))?;

    let date = chrono::Local::now().format("%Y-%m-%d");
    let heading = match title {
        Some(title) => title.to_string(),
        None => format!("Speaking Task {task} Feedback"),
    };

    let mut post = format!("# {heading}\n\n_{date}_\n\n## Question\n\n> {}\n", assets.question);

    for (student, record) in &records {
        let parsed = match feedback::parse(&record.feedback, &record.original_response, true) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Leaving {student} out of the post: {e}");
                continue;
            }
        };

        post.push_str(&format!("\n## {student}\n\n"));
        post.push_str(&format!("**Original:** {}\n\n", parsed.original_text));
        post.push_str(&format!(
            "**Changes:** {}\n\n",
            render_diff(&parsed.original_text, &parsed.revised_text)
        ));
        post.push_str(&format!("**Revised:** {}\n", parsed.revised_text));
    }

    let path = root.join(format!("task{task}_post.md"));
    write_atomic(&path, post.as_bytes())?;
    tracing::info!("Study post saved to {}", path.display());
    Ok(())
}
