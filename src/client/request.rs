//! Generation request and result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::schema::ResponseSchema;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
/// Default output token budget.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
/// Default wall-clock timeout for plain generation calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Default wall-clock timeout for schema-constrained calls, which tend to
/// run longer when grounding is enabled.
pub const DEFAULT_SCHEMA_TIMEOUT: Duration = Duration::from_secs(180);

/// Requested output shape for a generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Free-form text, returned trimmed.
    Text,
    /// JSON requested via response MIME type; recovered through the parser.
    Json,
    /// JSON constrained by an explicit response schema.
    JsonSchema(ResponseSchema),
}

/// One immutable generation request.
///
/// Built once per call; the client never mutates it.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    /// Enable the service's fetch-this-URL tool.
    pub use_url_context: bool,
    /// Enable the service's web-search grounding tool.
    pub use_web_search: bool,
    pub output: OutputMode,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    /// Extract grounding sources from response metadata.
    pub extract_sources: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            use_url_context: false,
            use_web_search: true,
            output: OutputMode::Json,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            extract_sources: false,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_url_context(mut self, enable: bool) -> Self {
        self.use_url_context = enable;
        self
    }

    pub fn with_web_search(mut self, enable: bool) -> Self {
        self.use_web_search = enable;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_output_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_extract_sources(mut self, enable: bool) -> Self {
        self.extract_sources = enable;
        self
    }
}

/// A grounding source reported by the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// Payload of a successful generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPayload {
    Text(String),
    Json(Map<String, Value>),
}

/// Result of a generation call: the payload plus any grounding sources.
///
/// Created fresh per call and handed to the caller; no shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub payload: GenerationPayload,
    /// Empty when the response carried no grounding metadata or extraction
    /// was not requested. Never an error.
    pub sources: Vec<GroundingSource>,
}

impl GenerationResult {
    pub fn json(&self) -> Option<&Map<String, Value>> {
        match &self.payload {
            GenerationPayload::Json(map) => Some(map),
            GenerationPayload::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            GenerationPayload::Text(text) => Some(text),
            GenerationPayload::Json(_) => None,
        }
    }
}
