//! Shared DTOs (schemas-as-code) for the covgen workspace.
//!
//! # Design constraints
//! - These types cross a process boundary as JSON, so field names follow the host's camelCase.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod config;
pub mod context;
pub mod coverage;
pub mod transform;
pub mod worker;

/// Schema identifiers.
pub mod schema {
    pub const COVGEN_CACHE_ENTRY_V1: &str = "covgen.cache-entry.v1";
}
