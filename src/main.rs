#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # viva
//!
//! Command-line grader for TOEFL-style speaking responses. The `evaluate`
//! command sends a task's student transcripts to the configured
//! chat-completion service and persists the raw feedback; `format` turns the
//! persisted feedback into tables and highlighted diffs; `score` builds the
//! cross-task roster; `post` writes a markdown study post.

use std::{io::BufRead, path::Path, sync::Arc};

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};
use viva::{
    config,
    speaking::{
        TaskNumber,
        evaluate::{OpenAiEvaluator, RubricEvaluator},
        batch, report,
    },
};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Evaluate a task's transcripts against the rubrics
    Evaluate(Option<TaskNumber>),
    /// Parse persisted feedback into tables and highlighted diffs
    Format(Option<TaskNumber>),
    /// Aggregate scores across tasks into the roster
    Score,
    /// Write a markdown study post for a task
    Post(Option<TaskNumber>, Option<String>),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the optional task number
    fn t() -> impl Parser<Option<TaskNumber>> {
        positional::<TaskNumber>("TASK")
            .help("Task number (1-4); prompts interactively when omitted")
            .optional()
    }

    /// parses the optional post title
    fn title() -> impl Parser<Option<String>> {
        long("title")
            .help("Title for the study post")
            .argument::<String>("TITLE")
            .optional()
    }

    let evaluate = construct!(Cmd::Evaluate(t()))
        .to_options()
        .command("evaluate")
        .help("Evaluate student transcripts for a task");

    let format = construct!(Cmd::Format(t()))
        .to_options()
        .command("format")
        .help("Build the feedback table and highlighted changes for a task");

    let score = pure(Cmd::Score)
        .to_options()
        .command("score")
        .help("Aggregate raw and scaled scores across all tasks");

    let post = construct!(Cmd::Post(t(), title()))
        .to_options()
        .command("post")
        .help("Write a markdown study post for a task");

    let cmd = construct!([evaluate, format, score, post]);

    cmd.to_options()
        .descr("Grader for spoken-response tests")
        .run()
}

/// Prompts for a task number on stdin; any non-matching input exits the loop.
fn prompt_task(action: &str) -> Option<TaskNumber> {
    println!("Select the task number to {action} (1, 2, 3, or 4), or type any other input to quit:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    match line.trim().parse::<TaskNumber>() {
        Ok(task) => Some(task),
        Err(_) => {
            println!("Exiting the program.");
            None
        }
    }
}

/// Evaluates one task and prints its summary.
async fn evaluate_one(root: &Path, task: TaskNumber, evaluator: &RubricEvaluator) -> Result<()> {
    let catalog = config::rubrics();
    let summary =
        batch::evaluate_task(root, task, evaluator, &catalog, config::eval_concurrency()).await?;
    eprint!("{summary}");
    Ok(())
}

/// Runs the `evaluate` command, looping interactively when no task is given.
async fn run_evaluate(root: &Path, task: Option<TaskNumber>) -> Result<()> {
    let openai = config::openai_config()
        .context("OPENAI_API_KEY must be set to evaluate responses")?;
    let service = Arc::new(OpenAiEvaluator::new(&openai));
    let evaluator = RubricEvaluator::new(service, config::eval_timeout());

    match task {
        Some(task) => evaluate_one(root, task, &evaluator).await,
        None => {
            while let Some(task) = prompt_task("grade") {
                if let Err(e) = evaluate_one(root, task, &evaluator).await {
                    eprintln!("{e:#}");
                }
            }
            Ok(())
        }
    }
}

/// Runs the `format` command, looping interactively when no task is given.
fn run_format(root: &Path, task: Option<TaskNumber>) -> Result<()> {
    match task {
        Some(task) => {
            let summary = report::format_task(root, task)?;
            eprint!("{summary}");
            Ok(())
        }
        None => {
            while let Some(task) = prompt_task("process responses for") {
                match report::format_task(root, task) {
                    Ok(summary) => eprint!("{summary}"),
                    Err(e) => eprintln!("{e:#}"),
                }
            }
            Ok(())
        }
    }
}

/// Runs the `post` command, looping interactively when no task is given.
fn run_post(root: &Path, task: Option<TaskNumber>, title: Option<String>) -> Result<()> {
    match task {
        Some(task) => report::write_post(root, task, title.as_deref()),
        None => {
            while let Some(task) = prompt_task("write a post for") {
                if let Err(e) = report::write_post(root, task, title.as_deref()) {
                    eprintln!("{e:#}");
                }
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    config::ensure_initialized()?;
    let root = std::env::current_dir().context("Could not determine working directory")?;

    match options() {
        Cmd::Evaluate(task) => run_evaluate(&root, task).await?,
        Cmd::Format(task) => run_format(&root, task)?,
        Cmd::Score => {
            report::score_roster(&root)?;
        }
        Cmd::Post(task, title) => run_post(&root, task, title)?,
    };

    Ok(())
}
