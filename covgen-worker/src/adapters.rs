//! Default filesystem-backed port implementations.

use crate::ports::SourceReader;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        fs::read_to_string(path).with_context(|| format!("read source {}", path))
    }
}

/// In-memory sources for embedding and testing. Unknown paths fail like a missing file.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceReader {
    files: BTreeMap<Utf8PathBuf, String>,
}

impl InMemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl SourceReader for InMemorySourceReader {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        self.files
            .get(path)
            .cloned()
            .with_context(|| format!("no such file: {}", path))
    }
}
