//! Prompt construction for company analysis.
//!
//! Renders the natural-language instruction sent to the model: the main
//! template (loaded through [`loader`], with a hardcoded fallback) plus one
//! labeled section per user-supplied context field. Pure string assembly,
//! deterministic for identical inputs.

pub mod loader;

use tracing::{debug, warn};

/// Maximum research documents included in a prompt.
pub const MAX_RESEARCH_DOCUMENTS: usize = 3;
/// Maximum asset descriptions included in a prompt.
pub const MAX_ASSETS: usize = 5;
/// Character budget for each research document excerpt.
pub const RESEARCH_EXCERPT_CHARS: usize = 500;
/// Character budget for each asset description.
pub const ASSET_EXCERPT_CHARS: usize = 200;

/// A user-provided research document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchDocument {
    pub name: String,
    pub content: String,
}

/// A user-provided asset description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetDescription {
    pub name: String,
    pub description: String,
}

/// Optional extra context supplied by the caller to enrich the analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub system_instructions: Option<String>,
    pub knowledge_base: Option<String>,
    pub content_guidelines: Option<String>,
    pub research_documents: Vec<ResearchDocument>,
    pub assets: Vec<AssetDescription>,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.system_instructions.is_none()
            && self.knowledge_base.is_none()
            && self.content_guidelines.is_none()
            && self.research_documents.is_empty()
            && self.assets.is_empty()
    }
}

/// Build the full analysis prompt for a company URL.
pub fn build_company_prompt(url: &str, user_context: Option<&UserContext>) -> String {
    let mut prompt = match loader::load_prompt("opencontext", "company_context", &[("url", url)]) {
        Ok(p) => p,
        Err(e) => {
            warn!("prompt template unavailable, using fallback: {e}");
            fallback_prompt(url)
        }
    };

    if let Some(ctx) = user_context {
        let sections = context_sections(ctx);
        if !sections.is_empty() {
            prompt.push_str(
                "\n\nUse this additional context provided by the user to enhance your analysis:",
            );
            for section in &sections {
                prompt.push_str(section);
            }
            debug!("added {} user context sections", sections.len());
        }
    }

    prompt
}

/// Minimal prompt used when the template resource is unavailable.
fn fallback_prompt(url: &str) -> String {
    format!(
        "Analyze the company website at {url} and extract company context.\n\
         Return JSON with: company_name, company_url, industry, description, products,\n\
         target_audience, competitors, tone, voice_persona, visual_identity, authors.\n\
         Do not fabricate data; leave fields empty when information cannot be found.\n\
         Analyze: {url}"
    )
}

fn context_sections(ctx: &UserContext) -> Vec<String> {
    let mut sections = Vec::new();

    if let Some(text) = non_empty(&ctx.system_instructions) {
        sections.push(format!("\n\n## User Instructions:\n{text}"));
    }
    if let Some(text) = non_empty(&ctx.knowledge_base) {
        sections.push(format!("\n\n## Known Facts About This Company:\n{text}"));
    }
    if let Some(text) = non_empty(&ctx.content_guidelines) {
        sections.push(format!("\n\n## Content Guidelines:\n{text}"));
    }

    if !ctx.research_documents.is_empty() {
        let docs: Vec<String> = ctx
            .research_documents
            .iter()
            .take(MAX_RESEARCH_DOCUMENTS)
            .map(|doc| {
                let name = if doc.name.is_empty() { "Document" } else { &doc.name };
                format!("- {name}: {}...", truncate_chars(&doc.content, RESEARCH_EXCERPT_CHARS))
            })
            .collect();
        sections.push(format!("\n\n## Research Documents:\n{}", docs.join("\n")));
    }

    if !ctx.assets.is_empty() {
        let assets: Vec<String> = ctx
            .assets
            .iter()
            .take(MAX_ASSETS)
            .map(|asset| {
                let name = if asset.name.is_empty() { "Asset" } else { &asset.name };
                format!("- {name}: {}", truncate_chars(&asset.description, ASSET_EXCERPT_CHARS))
            })
            .collect();
        sections.push(format!("\n\n## Asset Descriptions:\n{}", assets.join("\n")));
    }

    sections
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
