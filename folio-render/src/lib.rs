//! # folio-render
//!
//! Template rendering library for folio.
//!
//! This crate handles HTML template rendering using Askama.

pub mod pages;
pub mod templates;

pub use pages::{RenderError, SiteRenderer};
pub use templates::{
    CardView, CardsTemplate, Layout, NavLink, NotFoundTemplate, PublicationView,
    PublicationsTemplate, TextTemplate, TypeOption,
};
