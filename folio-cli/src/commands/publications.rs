//! Publications command: filter the records of one publication page.

use crate::cache::load_or_build_site_index;
use crate::envelope::{envelope, PublicationListData};
use anyhow::{anyhow, Context, Result};
use folio_core::{PublicationListState, PublicationType, Selection, SiteIndex};
use std::path::Path;

pub struct PublicationsOptions {
    pub query: Option<String>,
    pub year: String,
    pub kind: String,
    pub options: bool,
    pub json: bool,
}

pub fn list_publications(config_path: &Path, slug: &str, opts: PublicationsOptions) -> Result<()> {
    let (_config, site_index) = load_or_build_site_index(config_path)?;
    let state = publication_state(
        &site_index,
        slug,
        opts.query.as_deref(),
        &opts.year,
        &opts.kind,
    )?;
    let page = site_index
        .find_by_slug(slug)
        .ok_or_else(|| anyhow!("Page '{}' not found", slug))?;

    if opts.options {
        let options = state.options();
        if opts.json {
            let payload = envelope("publications.options", options);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            let years: Vec<String> = options.years.iter().map(|y| y.to_string()).collect();
            let types: Vec<&str> = options.types.iter().map(|t| t.as_str()).collect();
            println!("years: {}", years.join(", "));
            println!("types: {}", types.join(", "));
        }
        return Ok(());
    }

    if opts.json {
        let payload = envelope(
            "publications.list",
            PublicationListData::from_state(page, &state),
        );
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "{}: {} of {} publications",
        page.title,
        state.visible_count(),
        state.records().len()
    );
    for record in state.visible() {
        let year = record.year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".into());
        let title = record.title.as_deref().unwrap_or(record.id.as_str());
        println!("- [{}] {} ({}, {})", record.id, title, year, record.kind);

        let authors: Vec<&str> = record.authors.iter().map(|a| a.name.as_str()).collect();
        if !authors.is_empty() {
            println!("  {}", authors.join(", "));
        }
        if let Some(venue) = record.venue() {
            println!("  {}", venue);
        }
    }

    Ok(())
}

/// Drive a [`PublicationListState`] from the command-line selections.
pub fn publication_state(
    site_index: &SiteIndex,
    slug: &str,
    query: Option<&str>,
    year: &str,
    kind: &str,
) -> Result<PublicationListState> {
    let page = site_index
        .find_by_slug(slug)
        .ok_or_else(|| anyhow!("Page '{}' not found", slug))?;
    let publications = page
        .publications()
        .ok_or_else(|| anyhow!("Page '{}' is a {} page", slug, page.content.kind_str()))?;

    let mut state = PublicationListState::new(publications.records.clone());
    if let Some(query) = query {
        state.set_query(query);
    }
    state.set_year(
        Selection::parse(year)
            .with_context(|| format!("Invalid year '{}' (expected a number or 'all')", year))?,
    );
    // Unknown type names parse to `Other` and select nothing.
    let kind: Selection<PublicationType> = Selection::parse(kind).unwrap_or_default();
    state.set_kind(kind);

    Ok(state)
}
