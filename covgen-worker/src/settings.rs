//! Clap-free settings for the coverage worker.

use camino::Utf8PathBuf;
use covgen_transform::Usage;
use covgen_transform::instrument::DEFAULT_COMMENT_PREFIXES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Persistent transform cache. `None` disables caching; every covered file is transformed.
    pub cache_dir: Option<Utf8PathBuf>,

    /// How files are loaded. Empty coverage is generated the way `require` would load them.
    pub usage: Usage,

    /// Line prefixes the built-in instrumenter skips as comments.
    pub comment_prefixes: Vec<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            usage: Usage::Require,
            comment_prefixes: DEFAULT_COMMENT_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}
