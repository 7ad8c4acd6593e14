//! Port traits abstracting file access away from the generator.

use camino::Utf8Path;

/// Reads a source file in full. A failure is fatal for that file only.
pub trait SourceReader: Send + Sync {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String>;
}
