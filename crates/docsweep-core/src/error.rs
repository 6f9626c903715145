//! Error type for setup and persistence failures.
//!
//! Per-id outcomes (not found, auth required, transport trouble) are
//! `FetchResult` values, never errors. Only things that stop a run before it
//! starts, or lose data while it runs, end up here.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Range bounds are reversed; raised before any request is sent.
    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid URL template {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("cookie file {}: {reason}", path.display())]
    Cookies { path: PathBuf, reason: String },

    /// Output locations could not be created or opened.
    #[error("setup failed for {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("HTTP client: {0}")]
    Http(#[from] curl::Error),

    /// Artifact or audit record could not be written.
    #[error("could not persist {what}: {source}")]
    Persistence {
        what: String,
        /// Source URL of the payload, when the failure happened during a fetch.
        url: Option<String>,
        #[source]
        source: io::Error,
    },

    #[error("could not write summary {}: {reason}", path.display())]
    Summary { path: PathBuf, reason: String },
}

impl SweepError {
    pub(crate) fn setup(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SweepError::Setup {
            path: path.into(),
            source,
        }
    }

    /// Attach the source URL to a persistence failure.
    pub(crate) fn with_url(self, url: &str) -> Self {
        match self {
            SweepError::Persistence { what, source, .. } => SweepError::Persistence {
                what,
                url: Some(url.to_string()),
                source,
            },
            other => other,
        }
    }

    /// Source URL carried by the error, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            SweepError::Persistence { url, .. } => url.as_deref(),
            _ => None,
        }
    }
}
