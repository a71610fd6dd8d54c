//! Turns built pages into HTML documents.

use askama::Template;
use folio_core::{
    models::{CardPage, PublicationPage, TextPage},
    Config, Page, PageContent, SiteIndex,
};
use thiserror::Error;

use crate::templates::*;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error in page '{slug}': {source}")]
    Template {
        slug: String,
        #[source]
        source: askama::Error,
    },
}

/// Renders pages of one built site with shared navigation.
pub struct SiteRenderer<'a> {
    config: &'a Config,
    index: &'a SiteIndex,
    year: i32,
}

impl<'a> SiteRenderer<'a> {
    /// `year` is shown in the footer
    pub fn new(config: &'a Config, index: &'a SiteIndex, year: i32) -> Self {
        Self {
            config,
            index,
            year,
        }
    }

    /// Render one page to a complete HTML document
    pub fn render_page(&self, page: &Page) -> Result<String, RenderError> {
        let layout = self.layout(
            &page.slug,
            &page.title,
            page.description.as_deref().unwrap_or_default(),
        );
        let description = page.description.clone().unwrap_or_default();
        let has_description = !description.is_empty();

        let rendered = match &page.content {
            PageContent::Text(text) => text_template(layout, page, text).render(),
            PageContent::Publication(publications) => {
                publications_template(layout, page, publications).render()
            }
            PageContent::Card(cards) => CardsTemplate {
                layout,
                title: page.title.clone(),
                description,
                has_description,
                cards: card_views(cards),
            }
            .render(),
        };

        rendered.map_err(|source| RenderError::Template {
            slug: page.slug.clone(),
            source,
        })
    }

    pub fn render_not_found(&self) -> Result<String, RenderError> {
        let layout = self.layout("404", "Page not found", "");
        NotFoundTemplate { layout }
            .render()
            .map_err(|source| RenderError::Template {
                slug: "404".to_string(),
                source,
            })
    }

    fn layout(&self, slug: &str, page_title: &str, page_description: &str) -> Layout {
        let base_url = self.config.normalized_base_url();
        let nav = self
            .index
            .pages
            .iter()
            .map(|p| NavLink {
                url: p.url_with_base(&base_url),
                title: p.title.clone(),
                active: p.slug == slug,
            })
            .collect();

        Layout {
            site_title: self.config.site.title.clone(),
            site_author: self.config.site.author.clone(),
            site_description: self.config.site.description.clone(),
            year: self.year,
            page_title: page_title.to_string(),
            page_description: if page_description.is_empty() {
                self.config.site.description.clone()
            } else {
                page_description.to_string()
            },
            slug: slug.to_string(),
            nav,
            base_url,
        }
    }
}

fn text_template(layout: Layout, page: &Page, text: &TextPage) -> TextTemplate {
    let description = page.description.clone().unwrap_or_default();
    let updated = page
        .updated
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_default();

    TextTemplate {
        layout,
        title: page.title.clone(),
        has_description: !description.is_empty(),
        description,
        has_updated: !updated.is_empty(),
        updated,
        content: text.html.clone(),
        has_toc: text.toc_html.is_some(),
        toc_html: text.toc_html.clone().unwrap_or_default(),
    }
}

fn publications_template(
    layout: Layout,
    page: &Page,
    publications: &PublicationPage,
) -> PublicationsTemplate {
    let description = page.description.clone().unwrap_or_default();
    PublicationsTemplate {
        layout,
        title: page.title.clone(),
        has_description: !description.is_empty(),
        description,
        show_filters: publications.show_filters,
        years: publications.options.years.clone(),
        types: publications.options.types.iter().map(TypeOption::from).collect(),
        entries: publications
            .records
            .iter()
            .map(PublicationView::from_record)
            .collect(),
        count: publications.records.len(),
    }
}

fn card_views(cards: &CardPage) -> Vec<CardView> {
    cards
        .cards
        .iter()
        .map(|rendered| {
            let card = &rendered.card;
            CardView {
                title: card.title.clone(),
                subtitle: card.subtitle.clone().unwrap_or_default(),
                has_subtitle: card.subtitle.is_some(),
                description_html: rendered.description_html.clone().unwrap_or_default(),
                has_description: rendered.description_html.is_some(),
                link: card.link.clone().unwrap_or_default(),
                has_link: card.link.is_some(),
                image: card.image.clone().unwrap_or_default(),
                has_image: card.image.is_some(),
                date: card.date.clone().unwrap_or_default(),
                has_date: card.date.is_some(),
                tags: card.tags.clone(),
            }
        })
        .collect()
}
