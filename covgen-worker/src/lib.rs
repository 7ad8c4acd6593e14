//! Empty-coverage generation for one isolated execution unit.
//!
//! The host sends one [`CoverageWorkerData`](covgen_types::worker::CoverageWorkerData) per file no
//! test loaded. [`CoverageWorker::worker`] answers with zero-valued coverage, or `None` when the
//! instrumentation policy excludes the file.
//!
//! # Port traits
//!
//! File access goes through [`SourceReader`](ports::SourceReader). The [`adapters`] module
//! provides the filesystem reader and an in-memory one for embedding.
//!
//! # Isolation
//!
//! Call [`install_fatal_handler`] before accepting the first job.

pub mod adapters;
mod error;
pub mod fatal;
mod generate;
pub mod ports;
pub mod settings;
mod worker;

pub use error::WorkerError;
pub use fatal::{FATAL_EXIT_CODE, fail_fast, install_fatal_handler};
pub use generate::generate_empty_coverage;
pub use settings::WorkerSettings;
pub use worker::CoverageWorker;
