//! Error types for covgen-transform.
//!
//! Configuration errors are detected while loading a pipeline, before any file is processed.
//! Everything else is local to the one file whose job raised it.

use crate::options::Usage;
use camino::Utf8PathBuf;
use thiserror::Error;

/// The configured transformers cannot serve the run. Never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("transformer `{name}` is not registered")]
    UnknownTransformer { name: String },

    #[error("transform pattern `{pattern}` is not a valid regex: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("transformer `{name}` cannot serve {usage} loads: it does not implement {required}")]
    MissingOperation {
        name: String,
        usage: Usage,
        required: &'static str,
    },

    #[error("transformer factory `{name}` failed: {message}")]
    Factory { name: String, message: String },

    #[error("project config cannot be fingerprinted: {message}")]
    Fingerprint { message: String },
}

/// A failure attributed to one file.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("cache key for {path} failed: {source:#}")]
    CacheKey {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("transformer `{transformer}` failed on {path}: {source:#}")]
    Process {
        transformer: String,
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("instrumenting {path} failed: {source:#}")]
    Instrument {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl TransformError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, TransformError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_operation_names_usage_and_operation() {
        let err = ConfigurationError::MissingOperation {
            name: "swc".to_string(),
            usage: Usage::Require,
            required: "`process`",
        };
        let msg = err.to_string();
        assert!(msg.contains("swc"));
        assert!(msg.contains("require"));
        assert!(msg.contains("`process`"));
    }

    #[test]
    fn process_error_keeps_cause_chain() {
        let err = TransformError::Process {
            transformer: "swc".to_string(),
            path: "/r/a.ts".into(),
            source: anyhow::anyhow!("unexpected token").context("parse"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/r/a.ts"));
        assert!(msg.contains("unexpected token"));
        assert!(!err.is_configuration());
    }
}
