use camino::{Utf8Path, Utf8PathBuf};
use covgen_types::config::ProjectConfig;
use covgen_types::transform::{CallerTransformOptions, TransformerConfig};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// How a module is being loaded, which decides the transformer operation to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Eager, synchronous load. Only `process` is ever called.
    #[default]
    Require,
    /// Asynchronous load. `processAsync` is preferred, `process` is the fallback.
    Import,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Usage::Require => f.write_str("require"),
            Usage::Import => f.write_str("import"),
        }
    }
}

/// File contents read during one job, shared by every step of that job.
///
/// Clones share storage. Never hand one instance to two jobs.
#[derive(Debug, Clone, Default)]
pub struct FileContentCache {
    files: Arc<Mutex<HashMap<Utf8PathBuf, Arc<str>>>>,
}

impl FileContentCache {
    pub fn insert(&self, path: impl Into<Utf8PathBuf>, contents: impl Into<Arc<str>>) {
        self.lock().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Arc<str>> {
        self.lock().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Utf8PathBuf, Arc<str>>> {
        // A poisoned map still holds complete entries; inserts are single statements.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Everything a transformer sees about one transform call.
///
/// `instrument` is fixed at construction; there is no way to change it afterwards.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    config: Arc<ProjectConfig>,
    config_string: Arc<str>,
    instrument: bool,
    caller: CallerTransformOptions,
    transformer_config: TransformerConfig,
    cache_fs: FileContentCache,
}

impl TransformOptions {
    pub fn new(
        config: Arc<ProjectConfig>,
        config_string: Arc<str>,
        instrument: bool,
        caller: CallerTransformOptions,
        transformer_config: TransformerConfig,
        cache_fs: FileContentCache,
    ) -> Self {
        Self {
            config,
            config_string,
            instrument,
            caller,
            transformer_config,
            cache_fs,
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Stable serialization of the project config, for cache busting.
    pub fn config_string(&self) -> &str {
        &self.config_string
    }

    pub fn instrument(&self) -> bool {
        self.instrument
    }

    pub fn caller(&self) -> CallerTransformOptions {
        self.caller
    }

    pub fn transformer_config(&self) -> &TransformerConfig {
        &self.transformer_config
    }

    pub fn cache_fs(&self) -> &FileContentCache {
        &self.cache_fs
    }
}

/// Stable string form of a project config.
///
/// Field order is the struct's declaration order and every map type in the config is ordered, so
/// equal configs give equal strings.
pub fn config_string(config: &ProjectConfig) -> serde_json::Result<String> {
    serde_json::to_string(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let cache = FileContentCache::default();
        let other = cache.clone();
        other.insert("/r/a.ts", "x");
        assert_eq!(cache.get(Utf8Path::new("/r/a.ts")).as_deref(), Some("x"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unknown_file_is_absent() {
        let cache = FileContentCache::default();
        assert!(cache.is_empty());
        assert!(cache.get(Utf8Path::new("/r/missing.ts")).is_none());
    }

    #[test]
    fn config_string_tracks_relevant_fields() {
        let a = ProjectConfig::default();
        let mut b = ProjectConfig::default();
        assert_eq!(config_string(&a).unwrap(), config_string(&b).unwrap());

        b.coverage_path_ignore_patterns.push("/dist/".to_string());
        assert_ne!(config_string(&a).unwrap(), config_string(&b).unwrap());
    }
}
