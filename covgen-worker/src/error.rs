//! Error types for covgen-worker.

use camino::{Utf8Path, Utf8PathBuf};
use covgen_transform::{ConfigurationError, TransformError};
use thiserror::Error;

/// A job failed. Every variant names the file except configuration errors, which the host
/// attributes to the job that surfaced them.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("cannot read {path}: {source:#}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("instrumented output for {path} carries no coverage map")]
    MissingCoverage { path: Utf8PathBuf },
}

impl WorkerError {
    pub fn is_configuration(&self) -> bool {
        match self {
            WorkerError::Configuration(_) => true,
            WorkerError::Transform(e) => e.is_configuration(),
            WorkerError::Io { .. } | WorkerError::MissingCoverage { .. } => false,
        }
    }

    /// Per-file failures may succeed on another attempt; configuration errors never will.
    pub fn is_retryable(&self) -> bool {
        !self.is_configuration()
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            WorkerError::Io { path, .. } | WorkerError::MissingCoverage { path } => Some(path),
            WorkerError::Transform(
                TransformError::CacheKey { path, .. }
                | TransformError::Process { path, .. }
                | TransformError::Instrument { path, .. },
            ) => Some(path),
            WorkerError::Configuration(_) | WorkerError::Transform(TransformError::Configuration(_)) => None,
        }
    }
}
