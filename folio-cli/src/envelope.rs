//! Shared JSON schema helpers for `--json` output and the dev server API.

use chrono::NaiveDate;
use folio_core::{FilterOptions, Page, PublicationListState, PublicationRecord};
use serde::Serialize;

pub const SCHEMA_VERSION: &str = "folio-v1";

/// Standard envelope for machine-consumable responses.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub schema_version: &'static str,
    pub kind: &'static str,
    pub data: T,
}

pub fn envelope<T>(kind: &'static str, data: T) -> Envelope<T> {
    Envelope {
        schema_version: SCHEMA_VERSION,
        kind,
        data,
    }
}

#[derive(Serialize)]
pub struct PageSummary {
    pub slug: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub page_type: &'static str,
    pub description: Option<String>,
    pub source: String,
    pub updated: Option<String>,
}

impl PageSummary {
    pub fn from_page(page: &Page, base_url: &str) -> Self {
        Self {
            slug: page.slug.clone(),
            title: page.title.clone(),
            url: page.url_with_base(base_url),
            page_type: page.content.kind_str(),
            description: page.description.clone(),
            source: page.source.clone(),
            updated: format_date(page.updated),
        }
    }
}

#[derive(Serialize)]
pub struct AppliedFilter {
    pub query: String,
    pub year: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Serialize)]
pub struct PublicationListData<'a> {
    pub slug: String,
    pub title: String,
    pub filter: AppliedFilter,
    pub total: usize,
    pub visible: usize,
    pub options: &'a FilterOptions,
    pub records: Vec<PublicationRecord>,
}

impl<'a> PublicationListData<'a> {
    pub fn from_state(page: &Page, state: &'a PublicationListState) -> Self {
        let filter = state.filter();
        Self {
            slug: page.slug.clone(),
            title: page.title.clone(),
            filter: AppliedFilter {
                query: filter.query.clone(),
                year: filter.year.to_string(),
                kind: filter.kind.to_string(),
            },
            total: state.records().len(),
            visible: state.visible_count(),
            options: state.options(),
            records: state.visible().map(PublicationRecord::published).collect(),
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}
