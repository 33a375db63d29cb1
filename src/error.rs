//! Error taxonomy for the surveillance pipeline.
//!
//! Every variant is fatal for a single load: the pipeline has no partial
//! results. Only [`PipelineError::is_transient`] failures are worth retrying.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upstream page or table structure no longer matches a hard-coded
    /// assumption. Retrying will not help.
    #[error("source layout changed: {assumption}")]
    SourceLayoutChanged { assumption: String },

    /// Transport failure (DNS, TLS, timeout, body read).
    #[error("GET {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("expected at least {expected} tables in dataset document, found {found}")]
    UnexpectedTableCount { expected: usize, found: usize },

    #[error("table {table} ({virus}): {reason}")]
    UnexpectedColumnShape {
        table: usize,
        virus: String,
        reason: String,
    },

    #[error("writing {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid value {value:?} for {key}")]
    Config { key: String, value: String },
}

impl PipelineError {
    pub fn layout(assumption: impl Into<String>) -> Self {
        Self::SourceLayoutChanged {
            assumption: assumption.into(),
        }
    }

    pub fn column_shape(table: usize, virus: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedColumnShape {
            table,
            virus: virus.into(),
            reason: reason.into(),
        }
    }

    pub fn export(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Export {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Network failures may clear up on their own; structural ones never do.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { .. } => true,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
