//! # opencontext
//!
//! Company context extraction from websites via grounded LLM generation.
//!
//! The crate asks a hosted generation service to research a company URL with
//! web-search grounding, requests structured JSON output, robustly recovers
//! a valid JSON object from whatever the model returns, and assembles it
//! into a typed [`CompanyContext`]. When no credential is available (or the
//! caller opts into graceful degradation), a no-network fallback derives a
//! company name from the domain alone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opencontext::{get_company_context, AnalyzeOptions};
//!
//! #[tokio::main]
//! async fn main() -> opencontext::Result<()> {
//!     let (context, ai_called) =
//!         get_company_context("acme.io", AnalyzeOptions::default()).await?;
//!
//!     println!("{} ({}): ai_called={ai_called}", context.company_name, context.industry);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Grounded generation client with timeout, retry, and backoff |
//! | [`transport`] | HTTP wire layer for the generation service |
//! | [`recovery`] | JSON recovery parser for free-text model responses |
//! | [`schema`] | Tagged response-schema descriptions for structured output |
//! | [`prompt`] | Prompt construction and template loading |
//! | [`context`] | Typed company context records, assembler, and fallback |

pub mod client;
pub mod context;
pub mod error;
pub mod prompt;
pub mod recovery;
pub mod schema;
pub mod transport;

// Re-export main types for convenience
pub use client::{
    GenerationPayload, GenerationRequest, GenerationResult, GroundedClient, GroundingSource,
    OutputMode, RetryConfig,
};
pub use context::{
    basic_detection, generate_slug, get_company_context, run_analysis, AnalyzeOptions,
    AuthorInfo, BlogImageExample, CompanyContext, LanguageStyle, VisualIdentity, VoicePersona,
};
pub use error::Error;
pub use prompt::{AssetDescription, ResearchDocument, UserContext};
pub use recovery::recover_json;
pub use schema::{company_context_schema, FieldKind, FieldSpec, ResponseSchema};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
