//! Transform result stores, keyed by cache digest.
//!
//! Equal keys always describe equal bytes, so writers never coordinate: each write lands in a
//! temporary file that is atomically renamed over the entry, and the last writer wins.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use covgen_types::schema::COVGEN_CACHE_ENTRY_V1;
use covgen_types::transform::{SourceMap, TransformedSource};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use tracing::debug;

pub trait TransformCache: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<TransformedSource>>;

    fn put(&self, key: &str, value: &TransformedSource) -> anyhow::Result<()>;
}

/// On-disk entry layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    schema: String,
    key: String,
    code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    map: Option<SourceMap>,
}

/// One JSON file per key under `<dir>/<first two hex chars>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsTransformCache {
    dir: Utf8PathBuf,
}

impl FsTransformCache {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> Utf8PathBuf {
        let shard = key.get(..2).unwrap_or("__");
        self.dir.join(shard).join(format!("{key}.json"))
    }
}

impl TransformCache for FsTransformCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<TransformedSource>> {
        let path = self.entry_path(key);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read cache entry {}", path)),
        };
        match serde_json::from_str::<CacheEntry>(&text) {
            Ok(entry) if entry.schema == COVGEN_CACHE_ENTRY_V1 && entry.key == key => {
                Ok(Some(TransformedSource {
                    code: entry.code,
                    map: entry.map,
                }))
            }
            Ok(_) => {
                debug!(path = %path, "ignoring cache entry with foreign schema or key");
                Ok(None)
            }
            Err(e) => {
                debug!(path = %path, error = %e, "ignoring unreadable cache entry");
                Ok(None)
            }
        }
    }

    fn put(&self, key: &str, value: &TransformedSource) -> anyhow::Result<()> {
        let path = self.entry_path(key);
        let parent = path
            .parent()
            .with_context(|| format!("cache entry {} has no parent", path))?;
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;

        let entry = CacheEntry {
            schema: COVGEN_CACHE_ENTRY_V1.to_string(),
            key: key.to_string(),
            code: value.code.clone(),
            map: value.map.clone(),
        };
        let bytes = serde_json::to_vec(&entry).context("encode cache entry")?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("create temp file in {}", parent))?;
        tmp.write_all(&bytes)
            .with_context(|| format!("write temp cache entry for {}", path))?;
        tmp.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("persist cache entry {}", path))?;
        debug!(path = %path, bytes = bytes.len(), "wrote cache entry");
        Ok(())
    }
}

/// Process-local store for embedding and testing.
#[derive(Debug, Default)]
pub struct InMemoryTransformCache {
    entries: Mutex<HashMap<String, TransformedSource>>,
}

impl InMemoryTransformCache {
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TransformedSource>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TransformCache for InMemoryTransformCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<TransformedSource>> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &TransformedSource) -> anyhow::Result<()> {
        self.lock().insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransformCache;

impl TransformCache for NoopTransformCache {
    fn get(&self, _key: &str) -> anyhow::Result<Option<TransformedSource>> {
        Ok(None)
    }

    fn put(&self, _key: &str, _value: &TransformedSource) -> anyhow::Result<()> {
        Ok(())
    }
}
