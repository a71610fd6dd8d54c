//! Slug generation for page names and heading anchors.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUN: OnceLock<Regex> = OnceLock::new();

fn hyphen_run() -> &'static Regex {
    HYPHEN_RUN.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a string to a URL-safe slug
///
/// Lowercases, turns whitespace and underscores into hyphens, drops
/// punctuation (unicode letters survive), collapses hyphen runs and trims
/// them from both ends.
///
/// # Examples
///
/// ```
/// use folio_core::slugify;
///
/// assert_eq!(slugify("Selected Publications"), "selected-publications");
/// assert_eq!(slugify("Teaching & Outreach"), "teaching-outreach");
/// assert_eq!(slugify("C++ Tools"), "c-tools");
/// ```
pub fn slugify(input: &str) -> String {
    let cleaned = input
        .to_lowercase()
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if matches!(g, " " | "_" | "\t" | "\n" | "\r\n") {
                Some("-")
            } else if c.is_ascii_alphanumeric() || c == '-' || c.is_alphabetic() {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    hyphen_run()
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}
