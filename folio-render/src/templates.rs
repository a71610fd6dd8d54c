//! Askama template definitions.

use askama::Template;
use folio_core::{PublicationRecord, PublicationType};

/// A navigation entry, one per built page
#[derive(Debug, Clone)]
pub struct NavLink {
    pub url: String,
    pub title: String,
    pub active: bool,
}

/// Site-wide values every page template needs
#[derive(Debug, Clone)]
pub struct Layout {
    // Site metadata
    pub site_title: String,
    pub site_author: String,
    pub site_description: String,
    pub year: i32,

    // Current page
    pub page_title: String,
    pub page_description: String,
    pub slug: String,

    pub nav: Vec<NavLink>,

    // Site base URL, always with leading and trailing slash
    pub base_url: String,
}

/// One publication as shown in the list
#[derive(Debug, Clone)]
pub struct PublicationView {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub has_authors: bool,
    pub venue: String,
    pub has_venue: bool,
    pub year: String,
    pub has_year: bool,
    pub kind: String,
    pub kind_label: String,
    pub description: String,
    pub has_description: bool,
    pub abstract_text: String,
    pub has_abstract: bool,
    pub bibtex: String,
    pub show_bibtex: bool,
    pub url: String,
    pub has_url: bool,

    /// Lowercased searchable fields, newline separated (read by the
    /// filter script)
    pub search_text: String,
}

impl PublicationView {
    pub fn from_record(record: &PublicationRecord) -> Self {
        let authors = record
            .authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let venue = record.venue().unwrap_or_default().to_string();
        let url = record
            .field("url")
            .map(str::to_string)
            .or_else(|| record.field("doi").map(doi_url))
            .unwrap_or_default();

        Self {
            id: record.id.clone(),
            title: record.title.clone().unwrap_or_else(|| record.id.clone()),
            has_authors: !authors.is_empty(),
            authors,
            has_venue: !venue.is_empty(),
            venue,
            year: record.year.map(|y| y.to_string()).unwrap_or_default(),
            has_year: record.year.is_some(),
            kind: record.kind.as_str().to_string(),
            kind_label: record.kind.label(),
            description: record.description.clone().unwrap_or_default(),
            has_description: record.description.is_some(),
            abstract_text: record.abstract_text.clone().unwrap_or_default(),
            has_abstract: record.abstract_text.is_some(),
            bibtex: record.bibtex.clone(),
            show_bibtex: !record.hidden_bib,
            has_url: !url.is_empty(),
            url,
            search_text: search_text(record),
        }
    }
}

fn doi_url(doi: &str) -> String {
    if doi.starts_with("http://") || doi.starts_with("https://") {
        doi.to_string()
    } else {
        format!("https://doi.org/{}", doi)
    }
}

/// The fields the text search looks at, lowercased. Kept separate by
/// newlines so a query never matches across two fields.
pub fn search_text(record: &PublicationRecord) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(record.title.as_deref());
    parts.extend(record.authors.iter().map(|a| a.name.as_str()));
    parts.extend(record.journal.as_deref());
    parts.extend(record.conference.as_deref());
    parts.join("\n").to_lowercase()
}

/// An entry in the type filter menu
#[derive(Debug, Clone)]
pub struct TypeOption {
    pub value: String,
    pub label: String,
}

impl From<&PublicationType> for TypeOption {
    fn from(kind: &PublicationType) -> Self {
        Self {
            value: kind.as_str().to_string(),
            label: kind.label(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CardView {
    pub title: String,
    pub subtitle: String,
    pub has_subtitle: bool,
    pub description_html: String,
    pub has_description: bool,
    pub link: String,
    pub has_link: bool,
    pub image: String,
    pub has_image: bool,
    pub date: String,
    pub has_date: bool,
    pub tags: Vec<String>,
}

/// Markdown text page
#[derive(Template)]
#[template(path = "text.html")]
pub struct TextTemplate {
    pub layout: Layout,

    pub title: String,
    pub description: String,
    pub has_description: bool,
    pub updated: String,
    pub has_updated: bool,

    // Content
    pub content: String,
    pub toc_html: String,
    pub has_toc: bool,
}

/// Publication list with search and filter controls
#[derive(Template)]
#[template(path = "publications.html")]
pub struct PublicationsTemplate {
    pub layout: Layout,

    pub title: String,
    pub description: String,
    pub has_description: bool,

    pub show_filters: bool,
    pub years: Vec<i32>,
    pub types: Vec<TypeOption>,

    pub entries: Vec<PublicationView>,
    pub count: usize,
}

/// Card grid page
#[derive(Template)]
#[template(path = "cards.html")]
pub struct CardsTemplate {
    pub layout: Layout,

    pub title: String,
    pub description: String,
    pub has_description: bool,

    pub cards: Vec<CardView>,
}

/// 404 error page template
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::parse_bibtex;

    #[test]
    fn test_publication_view() {
        let records = parse_bibtex(
            r#"@inproceedings{k1,
  author = {Ada Lovelace and Charles Babbage},
  title = {Notes},
  booktitle = {Proc. Engines},
  year = {1843},
  doi = {10.1000/xyz},
  hidden_bib = {yes}
}"#,
        );
        let view = PublicationView::from_record(&records[0]);

        assert_eq!(view.authors, "Ada Lovelace, Charles Babbage");
        assert_eq!(view.venue, "Proc. Engines");
        assert_eq!(view.year, "1843");
        assert_eq!(view.kind, "inproceedings");
        assert_eq!(view.url, "https://doi.org/10.1000/xyz");
        assert!(!view.show_bibtex);
        assert!(!view.has_abstract);
        insta::assert_snapshot!(view.search_text, @r"
        notes
        ada lovelace
        charles babbage
        proc. engines
        ");
    }

    #[test]
    fn test_untitled_record_falls_back_to_key() {
        let records = parse_bibtex("@misc{anon, note = {x}}");
        let view = PublicationView::from_record(&records[0]);
        assert_eq!(view.title, "anon");
        assert!(!view.has_year);
        assert!(!view.has_authors);
        assert!(view.show_bibtex);
    }
}
