#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Rubric-based evaluation of a single student response.
//!
//! The deterministic parts of the pipeline never talk to the network: all
//! service access goes through the [`TranscriptEvaluator`] capability trait,
//! so tests drive the pipeline with fakes.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest},
};
use async_trait::async_trait;
use bon::Builder;
use tokio::time::timeout;

use super::rubric::Rubric;

/// Fixed result for a response that is empty or whitespace-only. Produced
/// without contacting the evaluation service.
pub const NO_RESPONSE_SENTINEL: &str =
    "No response provided. Unable to evaluate language use or topic development.";

/// Everything needed to evaluate one student response against the rubrics.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct EvaluationRequest {
    /// The question posed to the student.
    pub question:                 String,
    /// The student's spoken response, transcribed.
    pub student_response:         String,
    /// Language-use rubric, always present.
    pub language_use_rubric:      Rubric,
    /// Topic-development rubric; its presence selects the prompt variant.
    pub topic_development_rubric: Option<Rubric>,
    /// Reading passage transcript, tasks 2-3.
    pub reading_transcript:       Option<String>,
    /// Listening passage transcript, tasks 2-4.
    pub listening_transcript:     Option<String>,
}

impl EvaluationRequest {
    /// Renders the instruction prompt sent to the evaluation service.
    ///
    /// Two fixed variants exist, selected solely by whether a
    /// topic-development rubric was supplied. Both instruct the exact bolded
    /// label format the feedback parser expects.
    pub fn render_prompt(&self) -> String {
        let language_use = self.language_use_rubric.render();

        let reading = match self.reading_transcript.as_deref() {
            Some(text) => format!("Reading Transcript: {text}\n\n"),
            None => String::new(),
        };
        let listening = match self.listening_transcript.as_deref() {
            Some(text) => format!("Listening Transcript: {text}\n\n"),
            None => String::new(),
        };

        match self.topic_development_rubric.as_ref() {
            Some(topic_development) => format!(
                "Evaluate the student's spoken response using the provided rubrics, focusing on \
                 language use and topic development:\n\n\
                 Language Use Rubric:\n{language_use}\n\n\
                 Topic Development Rubric:\n{topic_development}\n\n\
                 Please provide the feedback in the following format, using ** for bold text:\n\n\
                 **Score for Language Use:** [Rate between 0.0 and 4.0]\n\
                 **Score for Topic Development:** [Rate between 0.0 and 4.0]\n\
                 **Feedback:** [Detailed feedback here]\n\
                 **Revised Version:** [Revised text here, maintaining the structure and content \
                 of the original]\n\n\
                 Keep in mind, this was an oral speaking assignment. While grammar and word usage \
                 should be refined, the tone should remain informal and conversational.\n\n\
                 {reading}{listening}\
                 Question Given to Student:\n\"{question}\"\n\n\
                 Student's Spoken Response:\n\"{response}\"",
                topic_development = topic_development.render(),
                question = self.question,
                response = self.student_response.trim(),
            ),
            None => format!(
                "Evaluate the student's spoken response using the provided rubric, focusing on \
                 language use:\n\n\
                 Language Use Rubric:\n{language_use}\n\n\
                 Please provide the feedback in the following format, using ** for bold text:\n\n\
                 **Score for Language Use:** [Rate between 0.0 and 4.0]\n\
                 **Feedback:** [Detailed feedback here]\n\
                 **Revised Version:** [Revised text here, maintaining the structure and content \
                 of the original]\n\n\
                 Keep in mind, this was an oral speaking assignment. While grammar and word usage \
                 should be refined, the tone should remain informal and conversational.\n\n\
                 {reading}{listening}\
                 Student's Spoken Response:\n\"{response}\"",
                response = self.student_response.trim(),
            ),
        }
    }
}

/// Capability port for the external text-completion service.
#[async_trait]
pub trait TranscriptEvaluator: Send + Sync {
    /// Sends one prompt and returns the service's raw text output verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Production [`TranscriptEvaluator`] backed by an OpenAI-compatible chat API.
#[derive(Clone)]
pub struct OpenAiEvaluator {
    /// Optional API base override for OpenAI-compatible endpoints.
    api_base:    Option<String>,
    /// API key used to authenticate requests.
    api_key:     String,
    /// Model identifier for chat completions.
    model:       String,
    /// Sampling temperature; the grading prompts expect a low setting.
    temperature: f32,
    /// Optional nucleus-sampling override.
    top_p:       Option<f32>,
}

impl OpenAiEvaluator {
    /// Builds an evaluator from the crate configuration.
    pub fn new(openai: &crate::config::OpenAiEnv) -> Self {
        Self {
            api_base:    openai.api_base().map(str::to_owned),
            api_key:     openai.api_key().to_owned(),
            model:       openai.model().to_owned(),
            temperature: openai.temperature(),
            top_p:       openai.top_p(),
        }
    }
}

#[async_trait]
impl TranscriptEvaluator for OpenAiEvaluator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut openai_config = OpenAIConfig::new().with_api_key(self.api_key.clone());
        if let Some(api_base) = self.api_base.as_deref() {
            openai_config = openai_config.with_api_base(api_base);
        }
        let openai_client = OpenAIClient::with_config(openai_config);

        let messages = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()?
                .into(),
        ];

        let response = openai_client
            .chat()
            .create(CreateChatCompletionRequest {
                model: self.model.clone(),
                messages,
                temperature: Some(self.temperature),
                top_p: self.top_p,
                n: Some(1),
                stream: Some(false),
                ..Default::default()
            })
            .await
            .context("Chat completion request failed")?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .context("No content in chat completion response")
    }
}

/// Evaluates responses against rubrics by delegating to a
/// [`TranscriptEvaluator`].
#[derive(Clone)]
pub struct RubricEvaluator {
    /// The service port doing the actual completion call.
    service:  Arc<dyn TranscriptEvaluator>,
    /// Deadline applied to each service call.
    deadline: Duration,
}

impl RubricEvaluator {
    /// Creates an evaluator over the given service port with a per-request
    /// deadline.
    pub fn new(service: Arc<dyn TranscriptEvaluator>, deadline: Duration) -> Self {
        Self { service, deadline }
    }

    /// Evaluates one request, returning the raw feedback text.
    ///
    /// Empty or whitespace-only responses short-circuit to
    /// [`NO_RESPONSE_SENTINEL`] without a service call. A failed or timed-out
    /// call is retried once; a second failure propagates to the caller, which
    /// skips the student rather than aborting the batch.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<String> {
        if request.student_response.trim().is_empty() {
            return Ok(NO_RESPONSE_SENTINEL.to_string());
        }

        let prompt = request.render_prompt();

        match self.attempt(&prompt).await {
            Ok(feedback) => Ok(feedback),
            Err(first) => {
                tracing::warn!("Evaluation attempt failed, retrying once: {first:#}");
                self.attempt(&prompt)
                    .await
                    .context("Evaluation service failed after retry")
            }
        }
    }

    /// Runs a single deadline-bounded service call.
    async fn attempt(&self, prompt: &str) -> Result<String> {
        timeout(self.deadline, self.service.complete(prompt))
            .await
            .context("Evaluation service call timed out")?
    }
}
