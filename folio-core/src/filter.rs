//! Publication list filtering and the explicit list state built on it.

use crate::bibtex::{PublicationRecord, PublicationType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A filter criterion that is either open or pinned to one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: Option<&T>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => value == Some(expected),
        }
    }
}

impl<T: FromStr> Selection<T> {
    /// Parse `"all"` (any case) or an empty string as [`Selection::All`].
    pub fn parse(raw: &str) -> Result<Self, T::Err> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            raw.parse().map(Selection::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(value) => value.fmt(f),
        }
    }
}

impl FromStr for PublicationType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PublicationType::from_name(s))
    }
}

/// Search text plus year and type selections, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationFilter {
    pub query: String,
    pub year: Selection<i32>,
    pub kind: Selection<PublicationType>,
}

impl PublicationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_year(mut self, year: Selection<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn with_kind(mut self, kind: Selection<PublicationType>) -> Self {
        self.kind = kind;
        self
    }

    /// True when the record satisfies all three criteria.
    pub fn matches(&self, record: &PublicationRecord) -> bool {
        self.year.admits(record.year.as_ref())
            && self.kind.admits(Some(&record.kind))
            && matches_query(record, &self.query.trim().to_lowercase())
    }

    /// The records that pass, in their original order.
    pub fn apply<'a>(&self, records: &'a [PublicationRecord]) -> Vec<&'a PublicationRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn matches_query(record: &PublicationRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    let contains = |field: Option<&str>| {
        field
            .map(|text| text.to_lowercase().contains(needle))
            .unwrap_or(false)
    };

    contains(record.title.as_deref())
        || record
            .authors
            .iter()
            .any(|a| a.name.to_lowercase().contains(needle))
        || contains(record.journal.as_deref())
        || contains(record.conference.as_deref())
}

/// Distinct filter values present in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Newest first
    pub years: Vec<i32>,
    /// Ascending by type name
    pub types: Vec<PublicationType>,
}

impl FilterOptions {
    pub fn from_records(records: &[PublicationRecord]) -> Self {
        let years: BTreeSet<i32> = records.iter().filter_map(|r| r.year).collect();

        let mut types: Vec<PublicationType> = Vec::new();
        for record in records {
            if !types.contains(&record.kind) {
                types.push(record.kind.clone());
            }
        }
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        Self {
            years: years.into_iter().rev().collect(),
            types,
        }
    }
}

/// Publication list state for one page.
///
/// Inputs are set through the `set_*` methods; each one recomputes the
/// visible list and the available options from scratch.
#[derive(Debug, Clone, Default)]
pub struct PublicationListState {
    records: Vec<PublicationRecord>,
    filter: PublicationFilter,
    options: FilterOptions,
    visible: Vec<usize>,
}

impl PublicationListState {
    pub fn new(records: Vec<PublicationRecord>) -> Self {
        let mut state = Self::default();
        state.load(records);
        state
    }

    /// Replace the dataset (a fresh content load).
    pub fn load(&mut self, records: Vec<PublicationRecord>) {
        self.records = records;
        self.recompute();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
        self.recompute();
    }

    pub fn set_year(&mut self, year: Selection<i32>) {
        self.filter.year = year;
        self.recompute();
    }

    pub fn set_kind(&mut self, kind: Selection<PublicationType>) {
        self.filter.kind = kind;
        self.recompute();
    }

    pub fn filter(&self) -> &PublicationFilter {
        &self.filter
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn records(&self) -> &[PublicationRecord] {
        &self.records
    }

    pub fn visible(&self) -> impl Iterator<Item = &PublicationRecord> {
        self.visible.iter().map(|&i| &self.records[i])
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    fn recompute(&mut self) {
        self.options = FilterOptions::from_records(&self.records);
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.filter.matches(r))
            .map(|(i, _)| i)
            .collect();
    }
}
