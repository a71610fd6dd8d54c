use folio_core::{
    Config, DiagnosticSeverity, PageContent, PublicationFilter, PublicationType, Selection,
    SiteBuilder,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const BIB: &str = r#"
% Selected publications
@article{smith2021,
  author = {John Smith and Mary Jones},
  title = {Fast {LR} Parsing},
  journal = {Journal of Parsing},
  year = {2021},
  abstract = {We parse quickly.},
}

@inproceedings{jones2020,
  Author = "Mary Jones",
  TITLE = {Incremental Types},
  booktitle = {Proceedings of PL},
  year = 2020
}

@misc{broken2019,
  title = {Never closed,
  year = {2019}

@misc{notes2020,
  title = {Lecture notes},
  year = {2020},
  hidden_bib = {true}
}
"#;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn scaffold(root: &Path) {
    write(
        root,
        "folio.yml",
        "site:\n  title: Ada Lovelace\n  author: Ada Lovelace\nhome: about\n",
    );
    write(
        root,
        "pages/about.yml",
        "type: text\ntitle: About\nsource: about.md\norder: 1\n",
    );
    write(
        root,
        "pages/publications.yml",
        "type: publication\ntitle: Publications\nsource: publications.bib\norder: 2\n",
    );
    write(
        root,
        "pages/talks.yml",
        "type: card\ntitle: Talks\nsource: talks.yml\norder: 3\n",
    );
    write(
        root,
        "pages/teaching.yml",
        "type: text\ntitle: Teaching\nsource: teaching.md\norder: 4\n",
    );
    write(root, "content/about.md", "# Hi\n\nI study **analytical engines**.\n");
    write(root, "content/publications.bib", BIB);
    write(
        root,
        "content/talks.yml",
        "- title: On engines\n  date: 2024-05-01\n  tags: [invited]\n",
    );
}

#[test]
fn builds_every_page_type() {
    let dir = tempdir().unwrap();
    scaffold(dir.path());

    let config = Config::from_file(dir.path().join("folio.yml")).unwrap();
    let index = SiteBuilder::new(config).build().unwrap();

    let slugs: Vec<&str> = index.pages.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["about", "publications", "talks"]);
    assert_eq!(index.home.as_deref(), Some("about"));

    let (_, publications) = index.publication_pages().next().unwrap();
    let ids: Vec<&str> = publications.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["smith2021", "jones2020", "notes2020"]);
    assert_eq!(publications.options.years, vec![2021, 2020]);
    assert!(publications.show_filters);

    let smith = &publications.records[0];
    assert_eq!(smith.title.as_deref(), Some("Fast {LR} Parsing"));
    assert_eq!(smith.authors.len(), 2);
    assert_eq!(smith.abstract_text.as_deref(), Some("We parse quickly."));
    assert!(smith.bibtex.starts_with("@article{smith2021,"));
    assert!(smith.bibtex.ends_with('}'));

    let jones = &publications.records[1];
    assert_eq!(jones.kind, PublicationType::InProceedings);
    assert_eq!(jones.conference.as_deref(), Some("Proceedings of PL"));
    assert!(publications.records[2].hidden_bib);

    match &index.find_by_slug("talks").unwrap().content {
        PageContent::Card(cards) => assert_eq!(cards.cards[0].card.tags, vec!["invited"]),
        other => panic!("Expected card page, got {:?}", other),
    }
}

#[test]
fn reports_skipped_entries_and_missing_content() {
    let dir = tempdir().unwrap();
    scaffold(dir.path());

    let config = Config::from_file(dir.path().join("folio.yml")).unwrap();
    let index = SiteBuilder::new(config).build().unwrap();

    let skipped: Vec<_> = index
        .diagnostics
        .iter()
        .filter(|d| d.code == "bibtex.entry_skipped")
        .collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].severity, DiagnosticSeverity::Warning);
    assert!(skipped[0].message.contains("broken2019"));
    assert_eq!(skipped[0].page_slug.as_deref(), Some("publications"));

    let missing = index
        .diagnostics
        .iter()
        .find(|d| d.code == "content.not_found")
        .unwrap();
    assert_eq!(missing.severity, DiagnosticSeverity::Error);
    assert_eq!(missing.page_slug.as_deref(), Some("teaching"));
    assert!(index.find_by_slug("teaching").is_none());
}

#[test]
fn filters_built_publications() {
    let dir = tempdir().unwrap();
    scaffold(dir.path());

    let config = Config::from_file(dir.path().join("folio.yml")).unwrap();
    let index = SiteBuilder::new(config).build().unwrap();
    let (_, publications) = index.publication_pages().next().unwrap();

    let by_year = PublicationFilter::new().with_year(Selection::Only(2020));
    assert_eq!(by_year.apply(&publications.records).len(), 2);

    let none = by_year.with_query("smith");
    assert!(none.apply(&publications.records).is_empty());

    let smith = PublicationFilter::new().with_query("smith");
    let found = smith.apply(&publications.records);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "smith2021");
}

#[test]
fn unknown_page_type_fails_the_build() {
    let dir = tempdir().unwrap();
    scaffold(dir.path());
    write(dir.path(), "pages/gallery.yml", "type: gallery\ntitle: G\nsource: g\n");

    let config = Config::from_file(dir.path().join("folio.yml")).unwrap();
    let err = SiteBuilder::new(config).build().unwrap_err();
    assert!(err.to_string().contains("gallery.yml"));
}
