//! Company analysis entry point and the no-network fallback.

use std::env;
use tracing::{info, warn};
use url::Url;

use crate::client::request::DEFAULT_SCHEMA_TIMEOUT;
use crate::client::{GenerationRequest, GroundedClient};
use crate::context::CompanyContext;
use crate::error::Error;
use crate::prompt::{build_company_prompt, UserContext};
use crate::schema::company_context_schema;
use crate::Result;

/// Options for [`get_company_context`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Explicit credential; falls back to `GEMINI_API_KEY` / `GOOGLE_API_KEY`.
    pub api_key: Option<String>,
    /// Degrade to [`basic_detection`] instead of propagating failures.
    pub fallback_on_error: bool,
    pub user_context: Option<UserContext>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            fallback_on_error: true,
            user_context: None,
        }
    }
}

/// Prefix a URL with `https://` when no scheme is given.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Get company context for a URL, optionally degrading to basic detection.
///
/// Returns the context and a flag indicating whether the model was actually
/// invoked (`false` when the no-network fallback was used).
pub async fn get_company_context(
    url: &str,
    options: AnalyzeOptions,
) -> Result<(CompanyContext, bool)> {
    let api_key = options
        .api_key
        .clone()
        .or_else(|| env::var("GEMINI_API_KEY").ok())
        .or_else(|| env::var("GOOGLE_API_KEY").ok())
        .filter(|key| !key.trim().is_empty());

    let Some(api_key) = api_key else {
        if options.fallback_on_error {
            warn!("no API key available, using basic detection for {url}");
            return Ok((basic_detection(url), false));
        }
        return Err(Error::MissingApiKey);
    };

    match run_analysis(url, Some(api_key), options.user_context.as_ref()).await {
        Ok(context) => Ok((context, true)),
        Err(e) if options.fallback_on_error => {
            warn!("analysis failed for {url}, using basic detection: {e}");
            Ok((basic_detection(url), false))
        }
        Err(e) => Err(e),
    }
}

/// Run the full grounded analysis for a company URL.
///
/// Builds the prompt, calls the model with web-search grounding and a
/// schema-constrained response, and assembles the typed context. Transient
/// failures are retried inside the client; anything else propagates.
pub async fn run_analysis(
    url: &str,
    api_key: Option<String>,
    user_context: Option<&UserContext>,
) -> Result<CompanyContext> {
    let url = normalize_url(url);
    info!("running company analysis for {url}");

    let client = GroundedClient::new(api_key)?;
    analyze_with_client(&client, &url, user_context).await
}

/// Analysis pipeline over an existing client (tests inject mock backends).
pub(crate) async fn analyze_with_client(
    client: &GroundedClient,
    url: &str,
    user_context: Option<&UserContext>,
) -> Result<CompanyContext> {
    let prompt = build_company_prompt(url, user_context);
    let schema = company_context_schema();

    let request = GenerationRequest::new(prompt)
        .with_web_search(true)
        .with_extract_sources(true)
        .with_timeout(DEFAULT_SCHEMA_TIMEOUT);

    let result = client.generate_with_schema(&request, &schema).await?;

    let map = result
        .json()
        .ok_or_else(|| Error::parse("expected JSON payload from generation", ""))?;

    info!(
        "analysis complete: {}",
        map.get("company_name").and_then(|v| v.as_str()).unwrap_or("Unknown")
    );
    Ok(CompanyContext::from_value(map))
}

/// Derive minimal company context from a URL alone. No network call; cannot
/// fail.
///
/// The company name is the first DNS label of the domain (after stripping
/// `www.`), with hyphens replaced by spaces and title-cased. Every other
/// field keeps its documented default.
pub fn basic_detection(url: &str) -> CompanyContext {
    let url = normalize_url(url);

    let host = Url::parse(&url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_default();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    let label = domain.split('.').next().unwrap_or_default();
    let company_name = title_case(&label.replace('-', " "));

    CompanyContext {
        company_name,
        company_url: url,
        ..CompanyContext::default()
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme_only_when_missing() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn basic_detection_from_bare_domain() {
        let ctx = basic_detection("example.com");
        assert_eq!(ctx.company_name, "Example");
        assert_eq!(ctx.company_url, "https://example.com");

        // Every other field stays at its documented default.
        let mut expected = CompanyContext::default();
        expected.company_name = "Example".into();
        expected.company_url = "https://example.com".into();
        assert_eq!(ctx, expected);
    }

    #[test]
    fn basic_detection_strips_www_and_splits_hyphens() {
        let ctx = basic_detection("https://www.fourth-places.io/about");
        assert_eq!(ctx.company_name, "Fourth Places");
    }

    #[test]
    fn basic_detection_title_cases_mixed_input() {
        let ctx = basic_detection("ACME-corp.example.org");
        assert_eq!(ctx.company_name, "Acme Corp");
    }

    #[test]
    fn basic_detection_handles_garbage_without_panicking() {
        let ctx = basic_detection("not a url at all");
        assert_eq!(ctx.tone, "professional");
    }

    #[tokio::test]
    async fn permanent_failure_propagates_after_one_backend_call() {
        use crate::client::RetryConfig;
        use crate::transport::{BackendResponse, GenerationBackend};
        use async_trait::async_trait;
        use serde_json::Value;
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        struct RejectingBackend {
            calls: AtomicU32,
        }

        #[async_trait]
        impl GenerationBackend for RejectingBackend {
            async fn execute(&self, _body: &Value) -> crate::Result<BackendResponse> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Remote {
                    status: 400,
                    message: "invalid request".into(),
                })
            }
        }

        let backend = Arc::new(RejectingBackend {
            calls: AtomicU32::new(0),
        });
        let client = GroundedClient::from_backend(backend.clone(), RetryConfig::default());

        let err = analyze_with_client(&client, "https://acme.io", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote { status: 400, .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_key_without_fallback_is_an_error() {
        if env::var("GEMINI_API_KEY").is_ok() || env::var("GOOGLE_API_KEY").is_ok() {
            return;
        }
        let options = AnalyzeOptions {
            fallback_on_error: false,
            ..Default::default()
        };
        let err = get_company_context("example.com", options).await.unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[tokio::test]
    async fn missing_key_with_fallback_uses_basic_detection() {
        if env::var("GEMINI_API_KEY").is_ok() || env::var("GOOGLE_API_KEY").is_ok() {
            return;
        }
        let (ctx, ai_called) = get_company_context("example.com", AnalyzeOptions::default())
            .await
            .unwrap();
        assert!(!ai_called);
        assert_eq!(ctx.company_name, "Example");
    }
}
