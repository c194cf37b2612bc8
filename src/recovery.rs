//! Response recovery parser.
//!
//! Converts raw model output — correct JSON, JSON inside markdown fences,
//! JSON surrounded by prose, or near-JSON with syntax defects — into a valid
//! object. The stages form an ordered fallback chain; each one runs only if
//! the previous stage failed:
//!
//! 1. fence stripping (```json, then generic ```)
//! 2. anchor to the first `{`
//! 3. strict parse
//! 4. textual repair, then strict parse
//! 5. balanced-brace truncation, then strict parse, then repair once more
//!
//! The parser never returns partial or hand-assembled data: every success
//! path goes through a strict `serde_json` parse of some slice of the input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Error;
use crate::Result;

static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,])\s*([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
static MISSING_COMMA_AFTER_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new("([}\\]\"])\\s*\n\\s*\"").expect("valid regex"));
static MISSING_COMMA_BEFORE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new("([}\\]])\\s*\n\\s*\\{").expect("valid regex"));
static MISSING_COMMA_BEFORE_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new("([}\\]])\\s*\n\\s*\\[").expect("valid regex"));
static MISSING_COMMA_BETWEEN_STRINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new("\"\\s*\n\\s*\"").expect("valid regex"));

/// Recover a JSON object from raw model text.
///
/// Returns the parsed top-level object, or [`Error::Parse`] with a bounded
/// preview when every stage of the fallback chain fails.
pub fn recover_json(raw: &str) -> Result<Map<String, Value>> {
    let text = strip_fences(raw);

    // Anchor to the first object start; everything before it is prose.
    let text = match text.find('{') {
        Some(idx) => &text[idx..],
        None => return Err(Error::parse("could not find JSON object in response", text)),
    };

    if let Ok(map) = parse_object(text) {
        return Ok(map);
    }

    if let Ok(map) = parse_object(&repair_json(text)) {
        return Ok(map);
    }

    // Truncate at the point where brace depth first returns to zero; trailing
    // prose after a complete object is the most common remaining defect.
    let text = balanced_slice(text);

    if let Ok(map) = parse_object(text) {
        return Ok(map);
    }

    let repaired = repair_json(text);
    match parse_object(&repaired) {
        Ok(map) => {
            warn!("recovered JSON only after repair of truncated response");
            Ok(map)
        }
        Err(e) => Err(Error::parse(format!("JSON decode failed: {e}"), text)),
    }
}

/// Extract the content of the first markdown code fence, if any.
///
/// A ```json fence wins over a generic ``` fence; with neither present the
/// input is returned trimmed.
fn strip_fences(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        let inner = rest.split("```").next().unwrap_or(rest);
        return inner.trim();
    }
    if let Some(start) = text.find("```") {
        let rest = &text[start + "```".len()..];
        let inner = rest.split("```").next().unwrap_or(rest);
        return inner.trim();
    }
    text.trim()
}

fn parse_object(text: &str) -> std::result::Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str::<Map<String, Value>>(text)
}

/// Apply textual repairs for the malformed-JSON patterns the model actually
/// produces: unquoted keys, trailing commas, and missing commas between
/// adjacent values on separate lines.
fn repair_json(text: &str) -> String {
    let text = BARE_KEY.replace_all(text, "$1\"$2\":");
    let text = TRAILING_COMMA.replace_all(&text, "$1");
    let text = MISSING_COMMA_AFTER_CLOSE.replace_all(&text, "$1,\n\"");
    let text = MISSING_COMMA_BEFORE_OBJECT.replace_all(&text, "$1,\n{");
    let text = MISSING_COMMA_BEFORE_ARRAY.replace_all(&text, "$1,\n[");
    let text = MISSING_COMMA_BETWEEN_STRINGS.replace_all(&text, "\",\n\"");
    text.into_owned()
}

/// Truncate `text` at the index where brace depth first returns to zero.
///
/// The scan tracks quoted-string state and backslash escapes so that braces
/// inside string values are not counted and escaped quotes do not toggle
/// string state. If depth never balances, the input is returned unchanged.
fn balanced_slice(text: &str) -> &str {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &text[..i + ch.len_utf8()];
                }
            }
            _ => {}
        }
    }
    text
}
