//! # folio-core
//!
//! Core library for the folio portfolio site generator.
//!
//! This crate loads the site and page configuration, reads content sources,
//! parses BibTeX into publication records, filters them, and resolves every
//! page into renderable content.

pub mod bibtex;
pub mod builder;
pub mod cards;
pub mod config;
pub mod content;
pub mod filter;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod slug;

pub use bibtex::{
    parse_bibtex, parse_bibtex_report, Author, BibtexParse, PublicationRecord, PublicationType,
};
pub use builder::{BuildError, SiteBuilder};
pub use cards::Card;
pub use config::{Config, PageConfig, PageDefinition};
pub use content::{ContentError, ContentLoader};
pub use filter::{FilterOptions, PublicationFilter, PublicationListState, Selection};
pub use models::{
    Diagnostic, DiagnosticSeverity, Page, PageContent, PublicationPage, SiteIndex,
};
pub use slug::slugify;
