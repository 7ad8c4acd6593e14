//! Source transformation for coverage: the transformer contract, deterministic cache keys, and the
//! cached transform pipeline.
//!
//! # Contract
//!
//! Third-party code plugs in by implementing [`Transformer`] (or [`TransformerFactory`]) and
//! registering it in a [`TransformerRegistry`]. Which operation gets called for which [`Usage`] is
//! decided once, when a [`TransformPipeline`] is loaded, and never re-checked per file.
//!
//! # Per-file order
//!
//! The caller decides `instrument` first. Then: compute cache key → check cache → transform →
//! secondary instrumentation (only on a miss, when instrumenting, and when the transformer cannot
//! instrument itself) → store.

pub mod cache_key;
mod error;
pub mod instrument;
mod options;
mod pipeline;
mod registry;
pub mod store;
mod transformer;

pub use error::{ConfigurationError, TransformError};
pub use instrument::{Instrumenter, LineInstrumenter, read_initial_coverage};
pub use options::{FileContentCache, TransformOptions, Usage, config_string};
pub use pipeline::TransformPipeline;
pub use registry::{IDENTITY, IdentityTransformer, TransformerRegistry, TransformerSource};
pub use store::{FsTransformCache, InMemoryTransformCache, NoopTransformCache, TransformCache};
pub use transformer::{
    CacheKeyOp, LoadedTransformer, Operations, ProcessOp, Transformer, TransformerFactory,
    TransformerIdentity, UsagePlan,
};
