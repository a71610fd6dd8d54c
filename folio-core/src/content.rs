//! Raw content loading by source identifier.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Source '{0}' must be a relative path inside the content directory")]
    InvalidSource(String),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    /// Diagnostic code for this failure
    pub fn code(&self) -> &'static str {
        match self {
            ContentError::NotFound(_) => "content.not_found",
            ContentError::InvalidSource(_) => "content.invalid_source",
            ContentError::Io { .. } => "content.load_failed",
        }
    }
}

/// Reads markdown, BibTeX and card sources from the content directory.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    root: PathBuf,
}

impl ContentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a source identifier to a path, rejecting anything that would
    /// leave the content directory.
    pub fn resolve(&self, source: &str) -> Result<PathBuf, ContentError> {
        let rel = Path::new(source.trim());
        let escapes = rel.as_os_str().is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ContentError::InvalidSource(source.to_string()));
        }
        Ok(self.root.join(rel))
    }

    /// Read the raw text behind a source identifier.
    pub fn load(&self, source: &str) -> Result<String, ContentError> {
        let path = self.resolve(source)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!("Loaded {} bytes from {:?}", text.len(), path);
                Ok(text)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ContentError::NotFound(path)),
            Err(source) => Err(ContentError::Io { path, source }),
        }
    }
}
