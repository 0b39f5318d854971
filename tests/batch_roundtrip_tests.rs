use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use viva::speaking::{
    RubricEvaluator, TaskNumber, TranscriptEvaluator,
    batch::{self, evaluate_task},
    report,
    rubric::RubricCatalog,
};

/// Replays a well-formed feedback document for every prompt.
struct ScriptedService;

#[async_trait]
impl TranscriptEvaluator for ScriptedService {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok("**Score for Language Use:** 3.0\n\
            **Score for Topic Development:** 2.0\n\
            **Feedback:** Clear ideas, limited elaboration.\n\
            **Revised Version:** I believe the new schedule helps students focus."
            .to_string())
    }
}

fn task(n: u8) -> TaskNumber {
    TaskNumber::new(n).expect("valid task")
}

fn seed_task1(root: &Path) {
    fs::write(root.join("task1_question.txt"), "Do you prefer studying alone?\n")
        .expect("write question");
    let dir = root.join("task1_txt");
    fs::create_dir(&dir).expect("create transcript dir");
    fs::write(
        dir.join("mei_w3_task1.txt"),
        "I believe new schedule help students focus.\n",
    )
    .expect("write transcript");
    fs::write(dir.join("omar_w3_task1.txt"), "   \n").expect("write empty transcript");
}

fn evaluator() -> RubricEvaluator {
    RubricEvaluator::new(Arc::new(ScriptedService), Duration::from_secs(5))
}

#[tokio::test]
async fn evaluate_task_persists_the_responses_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    seed_task1(root);

    let catalog = RubricCatalog::load();
    let summary = evaluate_task(root, task(1), &evaluator(), &catalog, 2)
        .await
        .expect("evaluate");

    assert_eq!(summary.evaluated, vec!["mei".to_string(), "omar".to_string()]);
    assert!(summary.skipped.is_empty());

    let records = batch::load_responses(root, task(1)).expect("responses file");
    assert_eq!(records.len(), 2);
    assert_eq!(
        records["mei"].original_response,
        "I believe new schedule help students focus."
    );
    assert!(records["mei"].feedback.contains("**Score for Language Use:** 3.0"));
    // Whitespace-only transcript short-circuits to the sentinel.
    assert!(records["omar"].feedback.starts_with("No response provided."));

    // No stray temporary file left behind by the atomic publish.
    assert!(!root.join("task1_responses.json.tmp").exists());
}

#[tokio::test]
async fn evaluate_task_fails_when_no_transcripts_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("task1_question.txt"), "Question?\n").expect("write question");
    fs::create_dir(root.join("task1_txt")).expect("create transcript dir");

    let catalog = RubricCatalog::load();
    let err = evaluate_task(root, task(1), &evaluator(), &catalog, 2).await;
    assert!(err.is_err(), "expected missing transcripts error");
}

#[tokio::test]
async fn evaluate_task_fails_when_question_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir(root.join("task1_txt")).expect("create transcript dir");
    fs::write(root.join("task1_txt/mei_task1.txt"), "an answer").expect("write transcript");

    let catalog = RubricCatalog::load();
    let err = evaluate_task(root, task(1), &evaluator(), &catalog, 2).await;
    assert!(err.is_err(), "expected missing question error");
}

#[tokio::test]
async fn format_task_writes_csv_and_html() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    seed_task1(root);

    let catalog = RubricCatalog::load();
    evaluate_task(root, task(1), &evaluator(), &catalog, 2)
        .await
        .expect("evaluate");

    let summary = report::format_task(root, task(1)).expect("format");
    assert_eq!(summary.parsed, vec!["mei".to_string()]);
    // The sentinel record carries no labeled fields and is skipped, not
    // defaulted to zero.
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, "omar");

    let csv = fs::read_to_string(root.join("StudentFeedback_Task1.csv")).expect("csv");
    assert!(csv.starts_with("Student's name,Language Use,Topic Development,Overall Score"));
    assert!(csv.contains("mei,3,2,2.5"));
    assert!(!csv.contains("omar"));

    let html = fs::read_to_string(root.join("HighlightedChanges_Task1.html")).expect("html");
    assert!(html.contains("<h2>mei</h2>"));
    assert!(html.contains("<ins>"));
}

#[tokio::test]
async fn score_roster_aggregates_across_tasks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();

    // Tasks 1 and 3 have responses; tasks 2 and 4 are absent and contribute
    // zero rather than failing the roster.
    for n in [1u8, 3] {
        fs::write(
            root.join(format!("task{n}_question.txt")),
            "Question?\n",
        )
        .expect("write question");
        let tdir = root.join(format!("task{n}_txt"));
        fs::create_dir(&tdir).expect("create transcript dir");
        fs::write(
            tdir.join(format!("mei_w3_task{n}.txt")),
            "I believe new schedule help students focus.\n",
        )
        .expect("write transcript");

        let catalog = RubricCatalog::load();
        evaluate_task(root, task(n), &evaluator(), &catalog, 2)
            .await
            .expect("evaluate");
    }

    let totals = report::score_roster(root).expect("roster");
    let mei = totals.get("mei").expect("mei present");
    // Two tasks at overall (3.0 + 2.0) / 2 = 2.5 each.
    assert_eq!(mei.raw_total, 5.0);
    assert_eq!(mei.scaled, Some(9.0));

    let csv = fs::read_to_string(root.join("Student_Scores.csv")).expect("roster csv");
    assert!(csv.starts_with("Student Name,TOEFL Score,Total Raw Score"));
    assert!(csv.contains("mei,9,5"));
}

#[tokio::test]
async fn write_post_assembles_question_and_diffs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    seed_task1(root);

    let catalog = RubricCatalog::load();
    evaluate_task(root, task(1), &evaluator(), &catalog, 2)
        .await
        .expect("evaluate");

    report::write_post(root, task(1), Some("Week 3 Speaking Review")).expect("post");

    let post = fs::read_to_string(root.join("task1_post.md")).expect("post file");
    assert!(post.starts_with("# Week 3 Speaking Review"));
    assert!(post.contains("> Do you prefer studying alone?"));
    assert!(post.contains("## mei"));
    assert!(post.contains("<ins>"));
    assert!(!post.contains("## omar"));
}
