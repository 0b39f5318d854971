#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::Result;

use crate::speaking::rubric::RubricCatalog;

/// OpenAI credentials and tuning parameters sourced from the environment.
pub struct OpenAiEnv {
    /// Optional base URL for an OpenAI-compatible API endpoint.
    api_base:    Option<String>,
    /// API key used to authenticate requests.
    api_key:     String,
    /// Model identifier for chat completions.
    model:       String,
    /// Sampling temperature; grading runs at a fixed low setting.
    temperature: f32,
    /// Optional top-p override, if provided.
    top_p:       Option<f32>,
}

impl OpenAiEnv {
    /// Construct an `OpenAiEnv` from environment variables; returns `None`
    /// if the API key is missing.
    fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?.trim().to_owned();
        if api_key.is_empty() {
            return None;
        }

        let api_base = std::env::var("OPENAI_ENDPOINT")
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        let model = std::env::var("OPENAI_MODEL")
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let temperature = std::env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(0.5);
        let top_p = std::env::var("OPENAI_TOP_P")
            .ok()
            .and_then(|s| s.parse::<f32>().ok());

        Some(Self {
            api_base,
            api_key,
            model,
            temperature,
            top_p,
        })
    }

    /// Returns the API base URL override, if any.
    pub fn api_base(&self) -> Option<&str> {
        self.api_base.as_deref()
    }

    /// Returns the API key used for requests.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the configured top_p, if any.
    pub fn top_p(&self) -> Option<f32> {
        self.top_p
    }
}

/// Runtime configuration shared across the crate.
pub struct ConfigState {
    /// Cached OpenAI configuration, if available.
    openai:           Option<OpenAiEnv>,
    /// Built-in rubric catalog.
    rubrics:          RubricCatalog,
    /// Deadline applied to each evaluation service call.
    eval_timeout:     Duration,
    /// Maximum number of in-flight evaluation requests.
    eval_concurrency: usize,
}

impl ConfigState {
    /// Construct a new configuration instance by reading the environment and
    /// embedded rubric assets.
    fn new() -> Result<Self> {
        Ok(Self {
            openai:           OpenAiEnv::from_env(),
            rubrics:          RubricCatalog::load(),
            eval_timeout:     read_timeout_secs("VIVA_EVAL_TIMEOUT_SECS", 120),
            eval_concurrency: read_count("VIVA_EVAL_CONCURRENCY", 4),
        })
    }

    /// Returns the OpenAI configuration, if the API key is present.
    pub fn openai(&self) -> Option<&OpenAiEnv> {
        self.openai.as_ref()
    }

    /// Returns the rubric catalog.
    pub fn rubrics(&self) -> &RubricCatalog {
        &self.rubrics
    }

    /// Returns the per-request evaluation deadline.
    pub fn eval_timeout(&self) -> Duration {
        self.eval_timeout
    }

    /// Returns the evaluation concurrency limit.
    pub fn eval_concurrency(&self) -> usize {
        self.eval_concurrency
    }
}

/// Borrowed view of the OpenAI configuration tied to the global config.
pub struct OpenAiRef(ConfigHandle);

impl std::ops::Deref for OpenAiRef {
    type Target = OpenAiEnv;

    fn deref(&self) -> &Self::Target {
        self.0.openai.as_ref().expect("OpenAI config missing")
    }
}

/// Borrowed view of the rubric catalog tied to the global config.
pub struct RubricsRef(ConfigHandle);

impl std::ops::Deref for RubricsRef {
    type Target = RubricCatalog;

    fn deref(&self) -> &Self::Target {
        self.0.rubrics()
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let slot = slot();
    let mut guard = slot.lock().expect("config slot poisoned");
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = ConfigState::new().map(Arc::new)?;
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> ConfigHandle {
    ensure_initialized().expect("configuration initialization failed")
}

/// Returns the configured OpenAI environment, if set.
pub fn openai_config() -> Option<OpenAiRef> {
    let handle = get();
    if handle.openai.is_some() {
        Some(OpenAiRef(handle))
    } else {
        None
    }
}

/// Returns the built-in rubric catalog.
pub fn rubrics() -> RubricsRef {
    RubricsRef(get())
}

/// Returns the per-request evaluation deadline.
pub fn eval_timeout() -> Duration {
    get().eval_timeout()
}

/// Returns the evaluation concurrency limit.
pub fn eval_concurrency() -> usize {
    get().eval_concurrency()
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

/// Parses an environment variable into a count, falling back to `default`
/// when parsing fails, the variable is missing, or the value is zero.
fn read_count(env: &str, default: usize) -> usize {
    std::env::var(env)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
