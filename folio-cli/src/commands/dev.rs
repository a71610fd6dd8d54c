//! Dev server command implementation with JSON APIs.

use super::build::build_site_with_index;
use super::publications::publication_state;
use crate::envelope::{envelope, PageSummary, PublicationListData};
use anyhow::{Context, Result};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use folio_core::{Config, Diagnostic, SiteIndex};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    data: Arc<RwLock<SiteData>>,
}

struct SiteData {
    config: Config,
    site_index: SiteIndex,
}

/// Start development server with file watching
pub async fn dev_server(config_path: &Path, port: Option<u16>) -> Result<()> {
    // Initial build + in-memory index
    let (config, site_index) = build_site_with_index(config_path).context("Failed to build site")?;
    let port = port.unwrap_or(config.server.port);
    let output_dir = config.output_dir();
    let watched = watched_paths(&config, config_path);
    let shared_data = Arc::new(RwLock::new(SiteData { config, site_index }));

    // Set up file watching for rebuilds
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    for (path, mode) in &watched {
        if path.exists() {
            watcher
                .watch(path, *mode)
                .with_context(|| format!("Failed to watch {:?}", path))?;
            tracing::debug!("Watching {:?}", path);
        } else {
            tracing::warn!("Not watching {:?}: path does not exist", path);
        }
    }

    tokio::spawn({
        let data_handle = shared_data.clone();
        let config_path = config_path.to_path_buf();
        async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Ok(_ev) => {
                        // Debounce a bit by draining pending events
                        while rx.try_recv().is_ok() {}
                        tracing::info!("Change detected, rebuilding site...");
                        let res = tokio::task::spawn_blocking({
                            let config_path = config_path.clone();
                            move || build_site_with_index(&config_path)
                        })
                        .await;

                        match res {
                            Ok(Ok((config, site_index))) => {
                                let mut data = data_handle.write().await;
                                *data = SiteData { config, site_index };
                                tracing::info!("Rebuild complete");
                            }
                            Ok(Err(e)) => tracing::error!("Rebuild failed: {:?}", e),
                            Err(e) => tracing::error!("Rebuild task panicked: {}", e),
                        }
                    }
                    Err(err) => tracing::warn!("Watcher error: {}", err),
                }
            }
        }
    });

    let app = router(output_dir, shared_data);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Starting dev server on http://localhost:{}", port);
    println!("\nServing at http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    // Keep the watcher alive for as long as the server runs
    let _watcher = watcher;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(output_dir: PathBuf, data: Arc<RwLock<SiteData>>) -> Router {
    let static_files = ServeDir::new(&output_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(output_dir.join("404.html")));

    Router::new()
        .route("/api/pages", get(api_pages))
        .route("/api/publications/{slug}", get(api_publications))
        .fallback_service(static_files)
        .with_state(AppState { data })
        .layer(TraceLayer::new_for_http())
}

/// The config file plus every input directory. The output directory is
/// never watched since each rebuild writes to it.
fn watched_paths(config: &Config, config_path: &Path) -> Vec<(PathBuf, RecursiveMode)> {
    let mut paths = vec![
        (config_path.to_path_buf(), RecursiveMode::NonRecursive),
        (config.pages_dir(), RecursiveMode::Recursive),
        (config.content_dir(), RecursiveMode::Recursive),
    ];
    if let Some(theme) = config.theme_dir() {
        paths.push((theme, RecursiveMode::Recursive));
    }
    paths
}

// ---- API handlers ----

#[derive(Serialize)]
struct PagesData<'a> {
    home: Option<&'a str>,
    pages: Vec<PageSummary>,
    diagnostics: &'a [Diagnostic],
}

async fn api_pages(State(state): State<AppState>) -> Response {
    let data = state.data.read().await;
    let base_url = data.config.normalized_base_url();

    let payload = envelope(
        "site.pages",
        PagesData {
            home: data.site_index.home.as_deref(),
            pages: data
                .site_index
                .pages
                .iter()
                .map(|p| PageSummary::from_page(p, &base_url))
                .collect(),
            diagnostics: &data.site_index.diagnostics,
        },
    );

    Json(payload).into_response()
}

#[derive(Deserialize)]
struct PublicationParams {
    q: Option<String>,
    year: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn api_publications(
    State(state): State<AppState>,
    AxumPath(slug): AxumPath<String>,
    Query(params): Query<PublicationParams>,
) -> Response {
    let data = state.data.read().await;
    let Some(page) = data.site_index.find_by_slug(&slug) else {
        return (StatusCode::NOT_FOUND, format!("Page '{}' not found", slug)).into_response();
    };

    let result = publication_state(
        &data.site_index,
        &slug,
        params.q.as_deref(),
        params.year.as_deref().unwrap_or("all"),
        params.kind.as_deref().unwrap_or("all"),
    );

    match result {
        Ok(list) => {
            let payload = envelope(
                "publications.list",
                PublicationListData::from_state(page, &list),
            );
            Json(payload).into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, format!("{:#}", err)).into_response(),
    }
}
