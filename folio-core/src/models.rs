//! Content model structs for pages, diagnostics and the site index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bibtex::PublicationRecord;
use crate::cards::Card;
use crate::config::normalize_base_url;
use crate::filter::FilterOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

/// A non-fatal problem found while building the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable machine-readable code, e.g. `bibtex.entry_skipped`
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub page_slug: Option<String>,
    pub source_path: Option<String>,
    pub context: Option<String>,
}

/// Publication page body: the parsed records plus their filter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationPage {
    pub records: Vec<PublicationRecord>,
    pub options: FilterOptions,
    pub show_filters: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPage {
    pub html: String,
    pub toc_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedCard {
    #[serde(flatten)]
    pub card: Card,
    pub description_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPage {
    pub cards: Vec<RenderedCard>,
}

/// Resolved page content, one variant per page type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageContent {
    Publication(PublicationPage),
    Text(TextPage),
    Card(CardPage),
}

impl PageContent {
    pub fn kind_str(&self) -> &'static str {
        match self {
            PageContent::Publication(_) => "publication",
            PageContent::Text(_) => "text",
            PageContent::Card(_) => "card",
        }
    }
}

/// A single built page of the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// URL slug (from the page config file name)
    pub slug: String,

    /// Display title
    pub title: String,

    pub description: Option<String>,

    /// Source identifier from the page config
    pub source: String,

    pub updated: Option<NaiveDate>,

    pub content: PageContent,
}

impl Page {
    /// Get the URL for this page including a base path
    pub fn url_with_base(&self, base_url: &str) -> String {
        format!("{}{}", normalize_base_url(base_url), self.output_rel_path())
    }

    /// Relative output path for this page (no leading slash)
    pub fn output_rel_path(&self) -> String {
        format!("{}.html", self.slug)
    }

    pub fn publications(&self) -> Option<&PublicationPage> {
        match &self.content {
            PageContent::Publication(p) => Some(p),
            _ => None,
        }
    }
}

/// Everything a build produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteIndex {
    /// In navigation order
    pub pages: Vec<Page>,
    pub diagnostics: Vec<Diagnostic>,
    /// Slug of the page rendered as index.html
    pub home: Option<String>,
}

impl SiteIndex {
    /// Find a page by slug
    pub fn find_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    /// The page written as index.html
    pub fn home_page(&self) -> Option<&Page> {
        self.home.as_deref().and_then(|slug| self.find_by_slug(slug))
    }

    /// All publication pages
    pub fn publication_pages(&self) -> impl Iterator<Item = (&Page, &PublicationPage)> {
        self.pages
            .iter()
            .filter_map(|page| page.publications().map(|p| (page, p)))
    }

    /// Records of every publication page keyed by page slug, as written to
    /// `publications.json`.
    pub fn publications_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .publication_pages()
            .map(|(page, publications)| {
                (
                    page.slug.clone(),
                    serde_json::json!({
                        "title": page.title,
                        "records": publications
                            .records
                            .iter()
                            .map(PublicationRecord::published)
                            .collect::<Vec<_>>(),
                        "options": publications.options,
                    }),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }

    pub fn count_by_severity(&self, severity: DiagnosticSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_page(slug: &str) -> Page {
        Page {
            slug: slug.into(),
            title: "About".into(),
            description: None,
            source: "about.md".into(),
            updated: None,
            content: PageContent::Text(TextPage {
                html: "<p>Hi</p>".into(),
                toc_html: None,
            }),
        }
    }

    #[test]
    fn test_page_url() {
        let page = text_page("about");
        assert_eq!(page.url_with_base("/site"), "/site/about.html");
        assert_eq!(page.output_rel_path(), "about.html");
        assert!(page.publications().is_none());
    }

    #[test]
    fn test_home_page_lookup() {
        let index = SiteIndex {
            pages: vec![text_page("about"), text_page("cv")],
            diagnostics: vec![],
            home: Some("cv".into()),
        };
        assert_eq!(index.home_page().map(|p| p.slug.as_str()), Some("cv"));
        assert!(index.find_by_slug("missing").is_none());
        assert_eq!(index.publication_pages().count(), 0);
        assert_eq!(index.publications_json(), serde_json::json!({}));
    }

    #[test]
    fn test_publications_json_keyed_by_slug() {
        let records = crate::bibtex::parse_bibtex(
            "@article{k1, title={T}, year={2020}}\n@misc{k2, title={Hidden}, hidden_bib={true}}",
        );
        let options = FilterOptions::from_records(&records);
        let index = SiteIndex {
            pages: vec![
                text_page("about"),
                Page {
                    slug: "papers".into(),
                    title: "Papers".into(),
                    description: None,
                    source: "papers.bib".into(),
                    updated: None,
                    content: PageContent::Publication(PublicationPage {
                        records,
                        options,
                        show_filters: true,
                    }),
                },
            ],
            diagnostics: vec![],
            home: None,
        };

        let json = index.publications_json();
        assert_eq!(json["papers"]["title"], "Papers");
        assert_eq!(json["papers"]["records"][0]["id"], "k1");
        assert_eq!(json["papers"]["options"]["years"][0], 2020);
        assert!(json["papers"]["records"][0]["bibtex"]
            .as_str()
            .unwrap()
            .starts_with("@article{k1"));
        assert_eq!(json["papers"]["records"][1]["id"], "k2");
        assert_eq!(json["papers"]["records"][1]["bibtex"], "");
        assert!(json.get("about").is_none());
    }

    #[test]
    fn test_page_content_serializes_with_type_tag() {
        let json = serde_json::to_value(text_page("about")).unwrap();
        assert_eq!(json["content"]["type"], "text");
        assert_eq!(json["content"]["html"], "<p>Hi</p>");

        let back: Page = serde_json::from_value(json).unwrap();
        assert_eq!(back, text_page("about"));
    }
}
