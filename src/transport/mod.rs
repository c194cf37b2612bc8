//! HTTP wire layer for the generation service.
//!
//! Speaks the service's `generateContent` format: `contents`/`parts` message
//! shape, `system_instruction` as a top-level field, `generationConfig`
//! wrapping temperature and token limits, tool capabilities as a `tools`
//! array, and the API key as a `?key=` query parameter. Response text lives
//! at `candidates[0].content.parts[0].text`; grounding sources at
//! `candidates[0].groundingMetadata.groundingChunks[].web`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::env;
use tracing::debug;

use crate::client::request::{GenerationRequest, GroundingSource, OutputMode};
use crate::error::Error;
use crate::Result;

/// Default generation endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model; needs web-search grounding and response-schema support.
/// Overridable via the `GEMINI_MODEL` environment variable.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Raw outcome of one generation call.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    /// Trimmed candidate text.
    pub text: String,
    /// Full response body, kept for grounding-metadata extraction.
    pub raw: Value,
}

/// Seam between the client's retry policy and the network.
///
/// Production uses [`HttpTransport`]; tests inject scripted backends.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn execute(&self, body: &Value) -> Result<BackendResponse>;
}

/// Reqwest-backed transport for the generation service.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        // No client-level timeout: the wall-clock timeout is enforced per
        // request by the caller, so it can differ between call kinds.
        let client = reqwest::Client::builder().build()?;
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            api_key: api_key.into(),
        })
    }

    /// Override the endpoint root (tests point this at a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerationBackend for HttpTransport {
    async fn execute(&self, body: &Value) -> Result<BackendResponse> {
        debug!(model = %self.model, "sending generateContent request");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Fold the body into the message so transient markers in the
            // service's error text stay visible to classification.
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let raw: Value = response.json().await?;
        let text = raw
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| Error::parse("response contained no candidate text", &raw.to_string()))?;

        Ok(BackendResponse { text, raw })
    }
}

/// Render a [`GenerationRequest`] into the service's request body.
pub fn build_request_body(request: &GenerationRequest) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
    });

    if let Some(instruction) = &request.system_instruction {
        body["system_instruction"] = json!({ "parts": [{ "text": instruction }] });
    }

    let mut generation_config = json!({
        "temperature": request.temperature,
        "maxOutputTokens": request.max_output_tokens,
    });
    match &request.output {
        OutputMode::Text => {}
        OutputMode::Json => {
            generation_config["responseMimeType"] = json!("application/json");
        }
        OutputMode::JsonSchema(schema) => {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = schema.to_wire();
        }
    }
    body["generationConfig"] = generation_config;

    let mut tools = Vec::new();
    if request.use_url_context {
        tools.push(json!({ "url_context": {} }));
    }
    if request.use_web_search {
        tools.push(json!({ "google_search": {} }));
    }
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools);
    }

    body
}

/// Extract grounding sources from a response body.
///
/// Absent or unexpected metadata yields an empty list, never an error.
pub fn extract_grounding_sources(raw: &Value) -> Vec<GroundingSource> {
    raw.pointer("/candidates/0/groundingMetadata/groundingChunks")
        .and_then(|v| v.as_array())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| chunk.get("web"))
                .map(|web| GroundingSource {
                    uri: web.get("uri").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    title: web.get("title").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
