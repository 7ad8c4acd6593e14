use crate::config::{GlobalConfig, ProjectConfig};
use crate::context::ReporterContextSerialized;
use crate::coverage::FileCoverage;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// One empty-coverage job, as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageWorkerData {
    pub config: ProjectConfig,
    pub global_config: GlobalConfig,
    pub path: Utf8PathBuf,

    #[serde(default)]
    pub context: ReporterContextSerialized,
}

/// Zero-valued coverage for a file no test executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageWorkerResult {
    pub path: Utf8PathBuf,
    pub coverage: FileCoverage,
}

/// One line of the execution unit's output stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub path: Utf8PathBuf,

    #[serde(flatten)]
    pub outcome: WorkerOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkerOutcome {
    /// `None` means the file contributes nothing to the report.
    Result(Option<CoverageWorkerResult>),

    /// The job failed for this path. `retryable` is false for configuration errors.
    Error { message: String, retryable: bool },
}
