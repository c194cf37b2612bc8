//! Prompt template loader.
//!
//! Templates are plain text files under a prompt root, addressed by a
//! namespace/name pair drawn from a fixed whitelist. Component names are
//! validated against path traversal before touching the filesystem.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

use crate::error::Error;
use crate::Result;

/// Namespaces that may be addressed through the loader.
const VALID_NAMESPACES: &[&str] = &["opencontext", "shared"];

/// Environment variable overriding the prompt root directory.
const PROMPT_DIR_ENV: &str = "OPENCONTEXT_PROMPT_DIR";

static COMPONENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\-]+$").expect("valid regex"));

/// Validate a single path component.
///
/// Rejects traversal sequences, absolute paths, separators, and any
/// character outside `[A-Za-z0-9_-]`.
fn validate_component(name: &str, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Prompt {
            message: format!("invalid {what}: must be non-empty"),
        });
    }
    if name.contains("..") || name.starts_with('/') || name.starts_with('\\') {
        return Err(Error::Prompt {
            message: format!("invalid {what}: path traversal not allowed"),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::Prompt {
            message: format!("invalid {what}: path separators not allowed"),
        });
    }
    if !COMPONENT_NAME.is_match(name) {
        return Err(Error::Prompt {
            message: format!("invalid {what}: contains invalid characters"),
        });
    }
    Ok(())
}

/// Resolve the on-disk path of a prompt template.
///
/// The root is `OPENCONTEXT_PROMPT_DIR` when set, otherwise the `prompts/`
/// directory bundled with the crate sources. Deployments that relocate the
/// templates must set the environment variable.
pub fn prompt_path(namespace: &str, name: &str) -> Result<PathBuf> {
    validate_component(namespace, "namespace")?;
    validate_component(name, "prompt name")?;
    if !VALID_NAMESPACES.contains(&namespace) {
        return Err(Error::Prompt {
            message: format!(
                "invalid namespace: {namespace}; must be one of {VALID_NAMESPACES:?}"
            ),
        });
    }

    let root = std::env::var(PROMPT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts")));
    Ok(root.join(namespace).join(format!("{name}.txt")))
}

/// Whether a prompt template exists. Invalid names count as absent.
pub fn prompt_exists(namespace: &str, name: &str) -> bool {
    prompt_path(namespace, name)
        .map(|p| p.exists())
        .unwrap_or(false)
}

/// Load a prompt template and substitute `{placeholder}` values.
///
/// Unknown placeholders in the template are left intact, so a template may
/// carry literal braces without breaking substitution.
pub fn load_prompt(namespace: &str, name: &str, vars: &[(&str, &str)]) -> Result<String> {
    let path = prompt_path(namespace, name)?;
    let template = std::fs::read_to_string(&path).map_err(|e| Error::Prompt {
        message: format!("prompt file not found: {}: {e}", path.display()),
    })?;
    Ok(substitute(&template, vars))
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_in_namespace() {
        assert!(prompt_path("../etc", "passwd").is_err());
        assert!(prompt_path("..", "x").is_err());
    }

    #[test]
    fn rejects_separators_and_absolute_paths() {
        assert!(prompt_path("opencontext", "a/b").is_err());
        assert!(prompt_path("opencontext", "/abs").is_err());
        assert!(prompt_path("opencontext", "a\\b").is_err());
    }

    #[test]
    fn rejects_unlisted_namespace() {
        assert!(prompt_path("secrets", "key").is_err());
    }

    #[test]
    fn rejects_empty_and_odd_characters() {
        assert!(prompt_path("opencontext", "").is_err());
        assert!(prompt_path("opencontext", "name with spaces").is_err());
    }

    #[test]
    fn accepts_whitelisted_names() {
        let path = prompt_path("opencontext", "company_context").unwrap();
        assert!(path.ends_with("opencontext/company_context.txt"));
    }

    #[test]
    fn default_root_finds_bundled_templates_from_any_cwd() {
        if std::env::var(PROMPT_DIR_ENV).is_ok() {
            return;
        }
        let path = prompt_path("opencontext", "company_context").unwrap();
        assert!(path.is_absolute());
        assert!(path.exists(), "missing bundled template at {}", path.display());
    }

    #[test]
    fn substitution_replaces_known_placeholders_only() {
        let out = substitute("Analyze {url} with {unknown}", &[("url", "https://a.io")]);
        assert_eq!(out, "Analyze https://a.io with {unknown}");
    }

    #[test]
    fn missing_prompt_reports_nonexistent() {
        assert!(!prompt_exists("opencontext", "no-such-prompt"));
        assert!(!prompt_exists("../evil", "x"));
    }
}
