//! Company context records and the mapping assembler.
//!
//! Every string field defaults to empty (or its stated literal default) and
//! every list field defaults to empty, so callers may assume presence.
//! Unknown keys in a source mapping are ignored; malformed nested entries
//! are dropped individually instead of failing the whole assembly.

pub mod analyze;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub use analyze::{basic_detection, get_company_context, run_analysis, AnalyzeOptions};

/// Language style preferences for content writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageStyle {
    /// casual / professional / formal
    pub formality: String,
    /// simple / moderate / technical / expert
    pub complexity: String,
    /// short and punchy / mixed / detailed
    pub sentence_length: String,
    /// peer-to-peer / expert-to-learner / consultant-to-executive
    pub perspective: String,
}

impl Default for LanguageStyle {
    fn default() -> Self {
        Self {
            formality: "professional".into(),
            complexity: "moderate".into(),
            sentence_length: "mixed".into(),
            perspective: "expert-to-learner".into(),
        }
    }
}

/// Writing persona tailored to the ideal customer profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicePersona {
    pub icp_profile: String,
    pub voice_style: String,
    pub language_style: LanguageStyle,
    pub sentence_patterns: Vec<String>,
    pub vocabulary_level: String,
    pub authority_signals: Vec<String>,
    pub do_list: Vec<String>,
    pub dont_list: Vec<String>,
    pub example_phrases: Vec<String>,
    pub opening_styles: Vec<String>,
}

/// Author information extracted from blog articles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorInfo {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub image_url: String,
    pub linkedin_url: String,
    pub twitter_url: String,
}

/// Example image from existing blog posts for style reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogImageExample {
    pub url: String,
    pub description: String,
    /// hero, inline, infographic, ...
    pub image_type: String,
}

impl Default for BlogImageExample {
    fn default() -> Self {
        Self {
            url: String::new(),
            description: String::new(),
            image_type: "hero".into(),
        }
    }
}

/// Visual identity for consistent image generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualIdentity {
    /// Primary brand colors as hex codes (e.g., #FF5733).
    pub brand_colors: Vec<String>,
    pub secondary_colors: Vec<String>,
    pub visual_style: String,
    pub design_elements: Vec<String>,
    pub typography_style: String,
    pub image_style_prompt: String,
    pub blog_image_examples: Vec<BlogImageExample>,
    pub mood: String,
    pub avoid_in_images: Vec<String>,
}

/// Company context extracted from a website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyContext {
    pub company_name: String,
    pub company_url: String,
    pub industry: String,
    pub description: String,
    pub products: Vec<String>,
    pub target_audience: String,
    /// Specific competitor company names.
    pub competitors: Vec<String>,
    /// Types of competing solutions.
    pub competitor_categories: Vec<String>,
    pub primary_region: String,
    pub primary_country: String,
    pub primary_language: String,
    pub tone: String,
    pub pain_points: Vec<String>,
    pub value_propositions: Vec<String>,
    pub use_cases: Vec<String>,
    pub content_themes: Vec<String>,
    pub voice_persona: VoicePersona,
    pub visual_identity: VisualIdentity,
    pub authors: Vec<AuthorInfo>,
}

impl Default for CompanyContext {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_url: String::new(),
            industry: String::new(),
            description: String::new(),
            products: Vec::new(),
            target_audience: String::new(),
            competitors: Vec::new(),
            competitor_categories: Vec::new(),
            primary_region: String::new(),
            primary_country: "US".into(),
            primary_language: "en".into(),
            tone: "professional".into(),
            pain_points: Vec::new(),
            value_propositions: Vec::new(),
            use_cases: Vec::new(),
            content_themes: Vec::new(),
            voice_persona: VoicePersona::default(),
            visual_identity: VisualIdentity::default(),
            authors: Vec::new(),
        }
    }
}

impl CompanyContext {
    /// Assemble a context from a recovered JSON mapping.
    ///
    /// Absent and wrong-typed fields keep their defaults. Nested persona and
    /// visual structures are built recursively; authors without a name are
    /// skipped silently; malformed image entries are skipped with a warning.
    pub fn from_value(data: &Map<String, Value>) -> Self {
        let mut ctx = Self::default();
        if data.is_empty() {
            return ctx;
        }

        set_string(&mut ctx.company_name, data, "company_name");
        set_string(&mut ctx.company_url, data, "company_url");
        set_string(&mut ctx.industry, data, "industry");
        set_string(&mut ctx.description, data, "description");
        set_list(&mut ctx.products, data, "products");
        set_string(&mut ctx.target_audience, data, "target_audience");
        set_list(&mut ctx.competitors, data, "competitors");
        set_list(&mut ctx.competitor_categories, data, "competitor_categories");
        set_string(&mut ctx.primary_region, data, "primary_region");
        set_string(&mut ctx.primary_country, data, "primary_country");
        set_string(&mut ctx.primary_language, data, "primary_language");
        set_string(&mut ctx.tone, data, "tone");
        set_list(&mut ctx.pain_points, data, "pain_points");
        set_list(&mut ctx.value_propositions, data, "value_propositions");
        set_list(&mut ctx.use_cases, data, "use_cases");
        set_list(&mut ctx.content_themes, data, "content_themes");

        if let Some(value) = data.get("voice_persona") {
            ctx.voice_persona = parse_voice_persona(value);
        }
        if let Some(value) = data.get("visual_identity") {
            ctx.visual_identity = parse_visual_identity(value);
        }
        if let Some(value) = data.get("authors") {
            ctx.authors = parse_authors(value);
        }

        ctx
    }
}

fn set_string(field: &mut String, data: &Map<String, Value>, key: &str) {
    if let Some(text) = data.get(key).and_then(Value::as_str) {
        *field = text.to_string();
    }
}

fn set_list(field: &mut Vec<String>, data: &Map<String, Value>, key: &str) {
    if let Some(items) = data.get(key).and_then(Value::as_array) {
        *field = items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
    }
}

fn parse_voice_persona(value: &Value) -> VoicePersona {
    match serde_json::from_value(value.clone()) {
        Ok(persona) => persona,
        Err(e) => {
            warn!("failed to parse voice_persona, using defaults: {e}");
            VoicePersona::default()
        }
    }
}

fn parse_visual_identity(value: &Value) -> VisualIdentity {
    let Value::Object(map) = value else {
        return VisualIdentity::default();
    };

    // Image examples are parsed entry-by-entry so one bad item does not
    // discard the rest of the visual identity.
    let mut map = map.clone();
    let examples = map.remove("blog_image_examples");

    let mut visual: VisualIdentity = match serde_json::from_value(Value::Object(map)) {
        Ok(visual) => visual,
        Err(e) => {
            warn!("failed to parse visual_identity, using defaults: {e}");
            VisualIdentity::default()
        }
    };

    if let Some(Value::Array(items)) = examples {
        for item in items {
            match serde_json::from_value::<BlogImageExample>(item) {
                Ok(example) if !example.url.is_empty() => {
                    visual.blog_image_examples.push(example)
                }
                Ok(_) => warn!("skipping blog image example without url"),
                Err(e) => warn!("skipping malformed blog image example: {e}"),
            }
        }
    }

    visual
}

fn parse_authors(value: &Value) -> Vec<AuthorInfo> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let Value::Object(map) = item else { return None };
            // Null optional fields become empty strings via the defaults.
            let cleaned: Map<String, Value> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let author: AuthorInfo = serde_json::from_value(Value::Object(cleaned)).ok()?;
            if author.name.is_empty() {
                None
            } else {
                Some(author)
            }
        })
        .collect()
}

static SLUG_INVALID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").expect("valid regex"));
static SLUG_HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid regex"));

/// Generate a URL-safe slug from a keyword.
///
/// Returns `"article"` when the input would produce an empty slug. Slugs
/// longer than `max_length` are truncated at a word boundary when one falls
/// past the halfway point.
pub fn generate_slug(keyword: &str, max_length: usize) -> String {
    if keyword.is_empty() {
        return "article".to_string();
    }

    let slug = keyword.to_lowercase();
    let slug = SLUG_INVALID.replace_all(slug.trim(), "");
    let slug = SLUG_SEPARATORS.replace_all(&slug, "-");
    let slug = SLUG_HYPHEN_RUNS.replace_all(&slug, "-");
    let mut slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        return "article".to_string();
    }

    if slug.len() > max_length {
        slug.truncate(max_length);
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > max_length / 2 {
                slug.truncate(last_hyphen);
            }
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn defaults_cover_every_field() {
        let ctx = CompanyContext::default();
        assert_eq!(ctx.company_name, "");
        assert_eq!(ctx.primary_country, "US");
        assert_eq!(ctx.primary_language, "en");
        assert_eq!(ctx.tone, "professional");
        assert!(ctx.products.is_empty());
        assert!(ctx.authors.is_empty());
        assert_eq!(ctx.voice_persona.language_style.formality, "professional");
        assert_eq!(ctx.voice_persona.language_style.perspective, "expert-to-learner");
        assert!(ctx.visual_identity.brand_colors.is_empty());
    }

    #[test]
    fn empty_mapping_assembles_to_defaults() {
        let ctx = CompanyContext::from_value(&Map::new());
        assert_eq!(ctx, CompanyContext::default());
    }

    #[test]
    fn flat_fields_are_assembled() {
        let data = object(json!({
            "company_name": "Acme",
            "industry": "Manufacturing",
            "products": ["Anvils", "Rockets"],
            "tone": "playful",
            "primary_country": "DE",
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.company_name, "Acme");
        assert_eq!(ctx.industry, "Manufacturing");
        assert_eq!(ctx.products, vec!["Anvils", "Rockets"]);
        assert_eq!(ctx.tone, "playful");
        assert_eq!(ctx.primary_country, "DE");
        // Untouched fields keep their documented defaults.
        assert_eq!(ctx.primary_language, "en");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let data = object(json!({
            "company_name": "Acme",
            "_grounding_sources": [{"uri": "https://a.io"}],
            "unexpected": {"deep": true},
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.company_name, "Acme");
    }

    #[test]
    fn wrong_typed_fields_keep_defaults() {
        let data = object(json!({
            "company_name": 42,
            "products": "not a list",
            "tone": ["not", "a", "string"],
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.company_name, "");
        assert!(ctx.products.is_empty());
        assert_eq!(ctx.tone, "professional");
    }

    #[test]
    fn nested_voice_persona_is_assembled() {
        let data = object(json!({
            "voice_persona": {
                "icp_profile": "Senior platform engineers",
                "language_style": { "formality": "casual" },
                "do_list": ["show code"],
            }
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.voice_persona.icp_profile, "Senior platform engineers");
        assert_eq!(ctx.voice_persona.language_style.formality, "casual");
        // Unspecified nested fields keep defaults.
        assert_eq!(ctx.voice_persona.language_style.complexity, "moderate");
        assert_eq!(ctx.voice_persona.do_list, vec!["show code"]);
    }

    #[test]
    fn authors_without_name_are_skipped() {
        let data = object(json!({
            "authors": [
                { "name": "Jane Doe", "title": "CTO" },
                { "title": "no name here" },
                { "name": "" },
                "not an object",
            ]
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.authors.len(), 1);
        assert_eq!(ctx.authors[0].name, "Jane Doe");
        assert_eq!(ctx.authors[0].title, "CTO");
    }

    #[test]
    fn null_author_fields_become_empty_strings() {
        let data = object(json!({
            "authors": [{ "name": "Jane Doe", "bio": null, "linkedin_url": null }]
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.authors[0].bio, "");
        assert_eq!(ctx.authors[0].linkedin_url, "");
    }

    #[test]
    fn malformed_image_examples_are_skipped_individually() {
        let data = object(json!({
            "visual_identity": {
                "brand_colors": ["#FF5733"],
                "blog_image_examples": [
                    { "url": "https://a.io/hero.png", "image_type": "hero" },
                    { "description": "missing url" },
                    { "url": "https://a.io/x.png", "image_type": ["bad"] },
                ]
            }
        }));
        let ctx = CompanyContext::from_value(&data);
        assert_eq!(ctx.visual_identity.brand_colors, vec!["#FF5733"]);
        assert_eq!(ctx.visual_identity.blog_image_examples.len(), 1);
        assert_eq!(
            ctx.visual_identity.blog_image_examples[0].url,
            "https://a.io/hero.png"
        );
    }

    #[test]
    fn assembly_round_trips_through_serialization() {
        let data = object(json!({
            "company_name": "Acme",
            "company_url": "https://acme.io",
            "industry": "SaaS",
            "description": "Acme builds anvils as a service.",
            "products": ["Anvil Cloud"],
            "target_audience": "Coyotes",
            "competitors": ["Wile E. Industries"],
            "competitor_categories": ["Traditional anvil makers"],
            "primary_region": "North America",
            "primary_country": "US",
            "primary_language": "en",
            "tone": "friendly",
            "pain_points": ["Falling rocks"],
            "value_propositions": ["Faster drops"],
            "use_cases": ["Canyon traps"],
            "content_themes": ["Physics"],
            "voice_persona": {
                "icp_profile": "Desert predators",
                "voice_style": "Energetic and direct.",
                "language_style": {
                    "formality": "casual",
                    "complexity": "simple",
                    "sentence_length": "short and punchy",
                    "perspective": "peer-to-peer"
                },
                "example_phrases": ["Drop it like it's hot"]
            },
            "visual_identity": {
                "brand_colors": ["#AA0000"],
                "visual_style": "bold",
                "mood": "playful",
                "blog_image_examples": [
                    { "url": "https://acme.io/img.png", "description": "hero shot", "image_type": "hero" }
                ]
            },
            "authors": [{ "name": "Road Runner", "title": "Evangelist" }]
        }));

        let assembled = CompanyContext::from_value(&data);
        let serialized = serde_json::to_value(&assembled).unwrap();
        let reassembled = CompanyContext::from_value(&object(serialized));
        assert_eq!(assembled, reassembled);
    }

    #[test]
    fn slug_basic() {
        assert_eq!(generate_slug("How to Build Anvils", 100), "how-to-build-anvils");
    }

    #[test]
    fn slug_strips_special_characters_and_collapses_hyphens() {
        assert_eq!(generate_slug("C++ & Rust -- a story!", 100), "c-rust-a-story");
    }

    #[test]
    fn slug_empty_and_symbol_only_inputs_fall_back() {
        assert_eq!(generate_slug("", 100), "article");
        assert_eq!(generate_slug("!!!", 100), "article");
    }

    #[test]
    fn slug_truncates_at_word_boundary() {
        let slug = generate_slug("alpha beta gamma delta epsilon", 20);
        assert!(slug.len() <= 20);
        assert!(!slug.ends_with('-'));
        assert_eq!(slug, "alpha-beta-gamma");
    }
}
