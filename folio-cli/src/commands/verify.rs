//! Verify site health and emit diagnostics.

use crate::envelope::envelope;
use anyhow::{bail, Context, Result};
use folio_core::{Config, Diagnostic, DiagnosticSeverity, SiteBuilder};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct VerificationSummary<'a> {
    pages: usize,
    publications: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    diagnostics: &'a [Diagnostic],
}

/// Run the build pipeline without rendering output and surface diagnostics.
///
/// Fails when any diagnostic is an error.
pub fn verify_site(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let builder = SiteBuilder::new(config);
    let site_index = builder
        .build()
        .context("Failed to build site for verification")?;

    let diagnostics = &site_index.diagnostics;
    let errors = site_index.count_by_severity(DiagnosticSeverity::Error);
    let warnings = site_index.count_by_severity(DiagnosticSeverity::Warning);
    let infos = site_index.count_by_severity(DiagnosticSeverity::Info);

    let summary = VerificationSummary {
        pages: site_index.pages.len(),
        publications: site_index
            .publication_pages()
            .map(|(_, p)| p.records.len())
            .sum(),
        errors,
        warnings,
        infos,
        diagnostics,
    };

    if json {
        let payload = serde_json::to_string_pretty(&envelope("site.verify", &summary))?;
        println!("{}", payload);
    } else {
        println!(
            "Verification complete: {} pages, {} publications, {} errors, {} warnings, {} info",
            summary.pages, summary.publications, errors, warnings, infos
        );
        for diag in diagnostics {
            let slug = diag
                .page_slug
                .as_deref()
                .map(|s| format!(" [{}]", s))
                .unwrap_or_default();
            let source = diag
                .source_path
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            println!(
                "- {:?} {}{}{}: {}",
                diag.severity, diag.code, slug, source, diag.message
            );
            if let Some(ctx) = &diag.context {
                println!("  context: {}", ctx);
            }
        }
    }

    if errors > 0 {
        bail!("Verification found {} error(s)", errors);
    }

    Ok(())
}
