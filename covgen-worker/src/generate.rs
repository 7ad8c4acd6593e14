use crate::error::WorkerError;
use crate::ports::SourceReader;
use camino::Utf8Path;
use covgen_policy::InstrumentationPolicy;
use covgen_transform::{FileContentCache, TransformPipeline, read_initial_coverage};
use covgen_types::transform::CallerTransformOptions;
use covgen_types::worker::CoverageWorkerResult;
use std::sync::Arc;
use tracing::debug;

/// Zero-valued coverage for a file no test loaded, or `None` when the policy excludes it.
///
/// The source is read before the policy runs, so an unreadable file fails even when it would
/// have been excluded. `load_pipeline` only runs for files the policy accepts.
pub async fn generate_empty_coverage<F>(
    reader: &dyn SourceReader,
    path: &Utf8Path,
    policy: &InstrumentationPolicy,
    load_pipeline: F,
) -> Result<Option<CoverageWorkerResult>, WorkerError>
where
    F: FnOnce() -> Result<Arc<TransformPipeline>, WorkerError>,
{
    let source = reader
        .read_to_string(path)
        .map_err(|source| WorkerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let cache_fs = FileContentCache::default();
    cache_fs.insert(path.to_path_buf(), source.as_str());

    if !policy.should_instrument(path) {
        debug!(path = %path, "not instrumented");
        return Ok(None);
    }

    let pipeline = load_pipeline()?;
    let transformed = pipeline
        .transform(
            path,
            &source,
            true,
            CallerTransformOptions::all(),
            &cache_fs,
        )
        .await?;

    let mut coverage =
        read_initial_coverage(&transformed.code).ok_or_else(|| WorkerError::MissingCoverage {
            path: path.to_path_buf(),
        })?;
    coverage.path = path.to_string();
    coverage.reset_hits();

    let counts = coverage.summary();
    debug!(
        path = %path,
        statements = counts.statements,
        functions = counts.functions,
        branches = counts.branches,
        "generated empty coverage"
    );
    Ok(Some(CoverageWorkerResult {
        path: path.to_path_buf(),
        coverage,
    }))
}
