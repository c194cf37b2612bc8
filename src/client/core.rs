//! Grounded generation client.
//!
//! One logical "ask the model" operation per call: build the request body
//! from the capability flags, issue the call under a wall-clock timeout, and
//! retry transient failures with exponential backoff. Retries are strictly
//! serial; each call owns its own attempt state and touches nothing shared.

use std::env;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::client::request::{
    GenerationPayload, GenerationRequest, GenerationResult, OutputMode,
};
use crate::client::retry::RetryConfig;
use crate::error::Error;
use crate::recovery::recover_json;
use crate::schema::ResponseSchema;
use crate::transport::{self, BackendResponse, GenerationBackend, HttpTransport};
use crate::Result;

/// Client for the grounded generation service.
///
/// The credential is resolved once at construction and held for the client's
/// lifetime. Cheap to share across tasks; independent calls are free to run
/// concurrently.
#[derive(Clone)]
pub struct GroundedClient {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryConfig,
}

impl GroundedClient {
    /// Build a client with the default retry policy.
    ///
    /// The key falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`. A
    /// missing key is a precondition failure, never retried.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_retry(api_key, RetryConfig::default())
    }

    pub fn with_retry(api_key: Option<String>, retry: RetryConfig) -> Result<Self> {
        let key = resolve_api_key(api_key).ok_or(Error::MissingApiKey)?;
        let transport = HttpTransport::new(key)?;
        debug!(model = transport.model(), "grounded client initialized");
        Ok(Self::from_backend(Arc::new(transport), retry))
    }

    /// Build a client over an explicit backend (tests, alternate transports).
    pub fn from_backend(backend: Arc<dyn GenerationBackend>, retry: RetryConfig) -> Self {
        Self { backend, retry }
    }

    /// Run one generation call per the request's output mode.
    ///
    /// Returns trimmed text for [`OutputMode::Text`], otherwise the JSON
    /// object recovered from the response.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.run(request).await
    }

    /// As [`GroundedClient::generate`], constraining the output to `schema`.
    ///
    /// When the request asks for sources, grounding metadata is extracted
    /// into the result (empty list when absent, never an error).
    pub async fn generate_with_schema(
        &self,
        request: &GenerationRequest,
        schema: &ResponseSchema,
    ) -> Result<GenerationResult> {
        let request = request
            .clone()
            .with_output(OutputMode::JsonSchema(schema.clone()));
        self.run(&request).await
    }

    async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let body = transport::build_request_body(request);
        let timeout_secs = request.timeout.as_secs();
        let total_attempts = self.retry.max_retries + 1;
        let mut last_error: Option<Error> = None;

        for attempt in 0..total_attempts {
            match tokio::time::timeout(request.timeout, self.backend.execute(&body)).await {
                Ok(Ok(response)) => return self.finish(request, response),
                Err(_) => {
                    warn!(
                        "generation request timed out (attempt {}/{})",
                        attempt + 1,
                        total_attempts
                    );
                    last_error = Some(Error::Timeout { secs: timeout_secs });
                }
                Ok(Err(e)) => {
                    if !e.is_transient() || attempt >= self.retry.max_retries {
                        error!("generation failed: {e}");
                        return Err(e);
                    }
                    warn!(
                        "generation failed (attempt {}/{}): {e}",
                        attempt + 1,
                        total_attempts
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.retry.max_retries {
                let delay = self.retry.backoff_delay(attempt);
                debug!("retrying in {:.1}s", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
        }

        error!("generation failed after {total_attempts} attempts");
        Err(last_error.unwrap_or(Error::Timeout { secs: timeout_secs }))
    }

    fn finish(
        &self,
        request: &GenerationRequest,
        response: BackendResponse,
    ) -> Result<GenerationResult> {
        let sources = if request.extract_sources && request.use_web_search {
            transport::extract_grounding_sources(&response.raw)
        } else {
            Vec::new()
        };

        let payload = match &request.output {
            OutputMode::Text => GenerationPayload::Text(response.text.trim().to_string()),
            OutputMode::Json | OutputMode::JsonSchema(_) => {
                GenerationPayload::Json(recover_json(&response.text)?)
            }
        };

        Ok(GenerationResult { payload, sources })
    }
}

fn resolve_api_key(explicit: Option<String>) -> Option<String> {
    let present = |key: String| if key.trim().is_empty() { None } else { Some(key) };
    explicit
        .and_then(present)
        .or_else(|| env::var("GEMINI_API_KEY").ok().and_then(present))
        .or_else(|| env::var("GOOGLE_API_KEY").ok().and_then(present))
}
