//! Crate-level error type and transient-failure classification.

use thiserror::Error;

/// Maximum number of characters of unparseable text carried in a parse error.
pub const PREVIEW_CHARS: usize = 200;

/// Unified error type for the OpenContext runtime.
///
/// Aggregates transport, remote, parse, and precondition failures into
/// actionable categories. [`Error::is_transient`] decides retry eligibility.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential available. Precondition failure: reported immediately,
    /// never retried.
    #[error("no API key provided; set GEMINI_API_KEY or GOOGLE_API_KEY, or pass one explicitly")]
    MissingApiKey,

    /// The wall-clock timeout on a generation attempt expired.
    #[error("generation request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// HTTP transport failure (connect, TLS, body read).
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the generation service. The response body is
    /// folded into `message` so transient markers like "overloaded" or a
    /// quota notice stay visible to classification.
    #[error("remote generation error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// The model response could not be recovered into valid JSON.
    /// Terminal for the parser; carries a bounded preview of the text.
    #[error("failed to recover JSON from model response: {message}; preview: {preview:?}")]
    Parse { message: String, preview: String },

    /// JSON serialization error outside the recovery chain.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt resource lookup or validation failure.
    #[error("prompt resource error: {message}")]
    Prompt { message: String },
}

/// Lowercase substrings that mark an error as transient.
///
/// Matched against the error's display text. This is a known-weak heuristic
/// carried over from the upstream service's observed failure messages; it is
/// kept as-is rather than strengthened into status-code matching.
const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "429",
    "500",
    "502",
    "503",
    "504",
    "overloaded",
    "quota",
    "temporarily unavailable",
    "connection",
    "timeout",
    "resource exhausted",
];

impl Error {
    /// Build a parse error carrying a bounded preview of the offending text.
    pub fn parse(message: impl Into<String>, text: &str) -> Self {
        Error::Parse {
            message: message.into(),
            preview: text.chars().take(PREVIEW_CHARS).collect(),
        }
    }

    /// Whether this error is likely to succeed on retry.
    ///
    /// Timeouts are always transient. Precondition and parse failures never
    /// are. Everything else is matched against the transient vocabulary.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::MissingApiKey | Error::Parse { .. } | Error::Prompt { .. } => false,
            other => {
                let text = other.to_string().to_lowercase();
                TRANSIENT_MARKERS.iter().any(|m| text.contains(m))
            }
        }
    }
}
