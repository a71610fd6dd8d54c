//! Site building logic - resolves page configs into rendered page content.

use crate::{
    bibtex::{parse_bibtex_report, SkippedEntry},
    cards::parse_cards,
    config::{CardPageConfig, Config, ConfigError, PageConfig, PageDefinition, TextPageConfig},
    content::{ContentError, ContentLoader},
    filter::FilterOptions,
    frontmatter::{parse_frontmatter, strip_frontmatter},
    markdown::MarkdownProcessor,
    models::*,
};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    loader: ContentLoader,
    processor: MarkdownProcessor,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        let loader = ContentLoader::new(config.content_dir());
        Self {
            config,
            loader,
            processor: MarkdownProcessor::new(),
        }
    }

    /// Build the entire site in memory. Nothing is written to disk.
    pub fn build(&self) -> Result<SiteIndex, BuildError> {
        let definitions = self.config.load_pages()?;
        tracing::info!("Found {} page configs", definitions.len());

        let mut pages = Vec::with_capacity(definitions.len());
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        for definition in &definitions {
            if let Some(page) = self.build_page(definition, &mut diagnostics) {
                pages.push(page);
            }
        }

        let home = self.resolve_home(&pages, &mut diagnostics);

        tracing::info!(
            "Built site index with {} pages ({} diagnostics)",
            pages.len(),
            diagnostics.len()
        );

        Ok(SiteIndex {
            pages,
            diagnostics,
            home,
        })
    }

    /// Resolve one page definition. Returns `None` when its content could
    /// not be loaded; the reason is pushed onto `diagnostics`.
    pub fn build_page(
        &self,
        definition: &PageDefinition,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Page> {
        let slug = definition.slug.as_str();
        let source = definition.config.source();

        let raw = match self.loader.load(source) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!("Page '{}': {}", slug, err);
                diagnostics.push(content_diagnostic(slug, source, &err));
                return None;
            }
        };

        let mut page = Page {
            slug: slug.to_string(),
            title: definition.config.title().to_string(),
            description: definition.config.description().map(str::to_string),
            source: source.to_string(),
            updated: None,
            content: PageContent::Text(TextPage {
                html: String::new(),
                toc_html: None,
            }),
        };

        match &definition.config {
            PageConfig::Publication(config) => {
                let parsed = parse_bibtex_report(&raw);
                for skipped in &parsed.skipped {
                    diagnostics.push(skipped_entry_diagnostic(slug, source, skipped));
                }
                tracing::debug!(
                    "Page '{}': {} publications, {} skipped",
                    slug,
                    parsed.records.len(),
                    parsed.skipped.len()
                );

                let options = FilterOptions::from_records(&parsed.records);
                page.content = PageContent::Publication(PublicationPage {
                    records: parsed.records,
                    options,
                    show_filters: config.filters,
                });
            }
            PageConfig::Text(config) => {
                self.fill_text_page(&mut page, config, &raw, diagnostics);
            }
            PageConfig::Card(config) => {
                page.content = PageContent::Card(self.render_cards(config, slug, &raw, diagnostics)?);
            }
        }

        Some(page)
    }

    fn fill_text_page(
        &self,
        page: &mut Page,
        config: &TextPageConfig,
        raw: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let body = match parse_frontmatter(raw) {
            Ok((frontmatter, body)) => {
                if let Some(title) = frontmatter.title.filter(|t| !t.trim().is_empty()) {
                    page.title = title;
                }
                if frontmatter.description.is_some() {
                    page.description = frontmatter.description;
                }
                if let Some(updated) = frontmatter.updated.as_deref() {
                    match NaiveDate::parse_from_str(updated.trim(), "%Y-%m-%d") {
                        Ok(date) => page.updated = Some(date),
                        Err(err) => diagnostics.push(Diagnostic {
                            code: "frontmatter.invalid".to_string(),
                            message: format!("Invalid 'updated' date '{}': {}", updated, err),
                            severity: DiagnosticSeverity::Warning,
                            page_slug: Some(page.slug.clone()),
                            source_path: Some(config.source.clone()),
                            context: Some("updated".to_string()),
                        }),
                    }
                }
                body
            }
            Err(err) => {
                tracing::warn!("Page '{}': {}", page.slug, err);
                diagnostics.push(Diagnostic {
                    code: "frontmatter.invalid".to_string(),
                    message: err.to_string(),
                    severity: DiagnosticSeverity::Warning,
                    page_slug: Some(page.slug.clone()),
                    source_path: Some(config.source.clone()),
                    context: None,
                });
                strip_frontmatter(raw).to_string()
            }
        };

        let rendered = self.processor.render(&body);
        let toc_html = if config.toc { rendered.toc_html() } else { None };
        page.content = PageContent::Text(TextPage {
            html: rendered.html,
            toc_html,
        });
    }

    fn render_cards(
        &self,
        config: &CardPageConfig,
        slug: &str,
        raw: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<CardPage> {
        let cards = match parse_cards(raw) {
            Ok(cards) => cards,
            Err(err) => {
                tracing::error!("Page '{}': {}", slug, err);
                diagnostics.push(Diagnostic {
                    code: "cards.invalid".to_string(),
                    message: err.to_string(),
                    severity: DiagnosticSeverity::Error,
                    page_slug: Some(slug.to_string()),
                    source_path: Some(config.source.clone()),
                    context: None,
                });
                return None;
            }
        };

        let cards = cards
            .into_iter()
            .map(|card| {
                let description_html = card
                    .description
                    .as_deref()
                    .map(|md| self.processor.render_html(md));
                RenderedCard {
                    card,
                    description_html,
                }
            })
            .collect();

        Some(CardPage { cards })
    }

    fn resolve_home(&self, pages: &[Page], diagnostics: &mut Vec<Diagnostic>) -> Option<String> {
        let first = pages.first().map(|p| p.slug.clone());

        match &self.config.home {
            None => first,
            Some(home) if pages.iter().any(|p| &p.slug == home) => Some(home.clone()),
            Some(home) => {
                tracing::warn!("Home page '{}' does not exist", home);
                diagnostics.push(Diagnostic {
                    code: "page.home_missing".to_string(),
                    message: format!(
                        "Configured home page '{}' was not built; using {}",
                        home,
                        first.as_deref().unwrap_or("no page")
                    ),
                    severity: DiagnosticSeverity::Warning,
                    page_slug: Some(home.clone()),
                    source_path: None,
                    context: None,
                });
                first
            }
        }
    }
}

fn content_diagnostic(slug: &str, source: &str, err: &ContentError) -> Diagnostic {
    Diagnostic {
        code: err.code().to_string(),
        message: err.to_string(),
        severity: DiagnosticSeverity::Error,
        page_slug: Some(slug.to_string()),
        source_path: Some(source.to_string()),
        context: None,
    }
}

fn skipped_entry_diagnostic(slug: &str, source: &str, skipped: &SkippedEntry) -> Diagnostic {
    let entry = match &skipped.key {
        Some(key) => format!("@{}{{{}}}", skipped.entry_type, key),
        None => format!("@{}", skipped.entry_type),
    };
    Diagnostic {
        code: "bibtex.entry_skipped".to_string(),
        message: format!("Skipped {} on line {}: {}", entry, skipped.line, skipped.error),
        severity: DiagnosticSeverity::Warning,
        page_slug: Some(slug.to_string()),
        source_path: Some(source.to_string()),
        context: Some(format!("line {}", skipped.line)),
    }
}
