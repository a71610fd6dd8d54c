//! Optional YAML frontmatter on markdown content.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Display overrides a markdown source may carry ahead of its body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Last-updated date shown under the page, `YYYY-MM-DD`
    #[serde(default)]
    pub updated: Option<String>,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX
        .get_or_init(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*(?:\n(.*))?$").unwrap())
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body). Without a leading `---`
/// block the whole text is the body.
///
/// # Example
///
/// ```
/// use folio_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: About me\n---\n# Hello\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title.as_deref(), Some("About me"));
/// assert!(body.trim().starts_with("# Hello"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok((frontmatter, body.to_string()))
}

/// Strip a frontmatter block without interpreting it.
pub fn strip_frontmatter(content: &str) -> &str {
    match frontmatter_regex().captures(content) {
        Some(captures) => captures.get(2).map(|m| m.as_str()).unwrap_or_default(),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: About
description: Short bio
updated: 2025-03-01
---

# Hello

I work on compilers."#;

        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("About"));
        assert_eq!(fm.description.as_deref(), Some("Short bio"));
        assert_eq!(fm.updated.as_deref(), Some("2025-03-01"));
        assert!(body.contains("# Hello"));
        assert!(body.contains("I work on compilers."));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_frontmatter_without_body() {
        let (fm, body) = parse_frontmatter("---\ntitle: Empty\n---").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Empty"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_empty_frontmatter_block() {
        let (fm, body) = parse_frontmatter("---\n\n---\nBody").unwrap();
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: [unclosed\n---\n\nContent.";
        assert!(parse_frontmatter(content).is_err());
        assert_eq!(strip_frontmatter(content).trim(), "Content.");
    }
}
