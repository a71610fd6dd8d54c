//! Build command implementation.

use crate::cache;
use anyhow::{Context, Result};
use chrono::Datelike;
use folio_core::{Config, DiagnosticSeverity, SiteBuilder, SiteIndex};
use folio_render::SiteRenderer;
use include_dir::{include_dir, Dir};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// Embed static assets (CSS, JS) at compile time
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../static");

/// Build the static site (writes output) and discard the in-memory index
pub fn build_site(config_path: &Path) -> Result<()> {
    build_site_with_index(config_path).map(|_| ())
}

/// Build the static site and return the in-memory index alongside the loaded config
pub fn build_site_with_index(config_path: &Path) -> Result<(Config, SiteIndex)> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    build_site_with_config(config)
}

/// Build the site from an already loaded config, writing output and returning the index.
pub fn build_site_with_config(config: Config) -> Result<(Config, SiteIndex)> {
    tracing::info!("Building site: {}", config.site.title);

    let builder = SiteBuilder::new(config.clone());
    let site_index = builder.build().context("Failed to build site")?;

    report_diagnostics(&site_index);
    write_site(&config, &site_index)?;

    tracing::info!("✓ Built {} pages", site_index.pages.len());
    tracing::info!("✓ Output written to {:?}", config.output_dir());

    if let Err(err) = cache::write_site_index_cache(&config, &site_index) {
        tracing::warn!("Failed to write site index cache: {}", err);
    }

    Ok((config, site_index))
}

/// Write every page, the 404 page, JSON artifacts and assets.
pub fn write_site(config: &Config, site_index: &SiteIndex) -> Result<()> {
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let renderer = SiteRenderer::new(config, site_index, chrono::Utc::now().year());

    for page in &site_index.pages {
        let html = renderer.render_page(page)?;
        let output_path = output_dir.join(page.output_rel_path());
        fs::write(&output_path, &html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Rendered: {}", page.slug);
    }

    match site_index.home_page() {
        Some(home) => {
            let index_path = output_dir.join("index.html");
            fs::copy(output_dir.join(home.output_rel_path()), &index_path)
                .with_context(|| format!("Failed to write {:?}", index_path))?;
        }
        None => tracing::warn!("No pages were built; index.html not written"),
    }

    let not_found = renderer.render_not_found()?;
    fs::write(output_dir.join("404.html"), not_found).context("Failed to write 404.html")?;

    generate_publications_json(config, site_index)?;
    copy_assets(config)?;

    Ok(())
}

fn report_diagnostics(site_index: &SiteIndex) {
    for diag in &site_index.diagnostics {
        let page = diag.page_slug.as_deref().unwrap_or("-");
        match diag.severity {
            DiagnosticSeverity::Error => {
                tracing::error!("[{}] {}: {}", page, diag.code, diag.message)
            }
            DiagnosticSeverity::Warning => {
                tracing::warn!("[{}] {}: {}", page, diag.code, diag.message)
            }
            DiagnosticSeverity::Info => {
                tracing::info!("[{}] {}: {}", page, diag.code, diag.message)
            }
        }
    }
}

/// Generate publications.json with the records of every publication page
fn generate_publications_json(config: &Config, site_index: &SiteIndex) -> Result<()> {
    let json = serde_json::to_string_pretty(&site_index.publications_json())
        .context("Failed to serialize publications")?;
    let output_path = config.output_dir().join("publications.json");
    fs::write(&output_path, json).context("Failed to write publications.json")?;

    tracing::debug!("Generated publications.json");
    Ok(())
}

fn copy_assets(config: &Config) -> Result<()> {
    let output_dir = config.output_dir();
    extract_embedded_static(&output_dir)?;
    tracing::debug!("Copied assets from embedded static bundle");

    // Copy custom theme directory if provided
    if let Some(theme_dir) = config.theme_dir() {
        if theme_dir.exists() {
            copy_dir(&theme_dir, &output_dir)?;
            tracing::info!("Copied custom theme from {:?}", theme_dir);
        } else {
            tracing::warn!("Configured theme path {:?} does not exist", theme_dir);
        }
    }

    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
    }
    Ok(())
}

fn extract_embedded_static(dest: &Path) -> Result<()> {
    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, dest)?;
    }
    Ok(())
}

fn extract_entry(entry: &include_dir::DirEntry, dest: &Path) -> Result<()> {
    match entry {
        include_dir::DirEntry::Dir(dir) => {
            for sub_entry in dir.entries() {
                extract_entry(sub_entry, dest)?;
            }
        }
        include_dir::DirEntry::File(file) => {
            let target = dest.join(file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, file.contents())
                .with_context(|| format!("Failed to write embedded static file to {:?}", target))?;
        }
    }
    Ok(())
}
