//! Configuration file loading for the coverage worker.
//!
//! Discovers and loads `covgen.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use covgen_transform::Usage;
use covgen_transform::instrument::DEFAULT_COMMENT_PREFIXES;
use covgen_worker::WorkerSettings;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "covgen.toml";

/// Top-level configuration from covgen.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    pub cache: CacheConfig,
    pub instrument: InstrumentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Persist transform results across runs.
    pub enabled: bool,

    /// Cache directory. Relative paths resolve against the working directory.
    pub dir: Option<Utf8PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstrumentConfig {
    /// Line prefixes the built-in instrumenter treats as comments.
    pub comment_prefixes: Vec<String>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            comment_prefixes: DEFAULT_COMMENT_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<WorkerConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<WorkerConfig> {
    let config: WorkerConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<WorkerConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(WorkerConfig::default()),
    }
}

/// Cache location used when caching is on and no directory is configured.
pub fn default_cache_dir() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("."))
        .join("covgen")
}

/// CLI overrides, already parsed.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub cache_dir: Option<Utf8PathBuf>,
    pub no_cache: bool,
    pub usage: Option<Usage>,
    pub comment_prefixes: Vec<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: WorkerConfig,
    cwd: Utf8PathBuf,
}

impl ConfigMerger {
    pub fn new(config: WorkerConfig, cwd: Utf8PathBuf) -> Self {
        Self { config, cwd }
    }

    /// `--no-cache` wins over everything; `--cache-dir` replaces the file's directory; non-empty
    /// CLI comment prefixes replace the file's list.
    pub fn merge(self, cli: &CliOverrides) -> WorkerSettings {
        let cache_dir = if cli.no_cache || !self.config.cache.enabled {
            None
        } else {
            let dir = cli
                .cache_dir
                .clone()
                .or(self.config.cache.dir)
                .unwrap_or_else(default_cache_dir);
            Some(if dir.is_absolute() {
                dir
            } else {
                self.cwd.join(dir)
            })
        };

        let comment_prefixes = if cli.comment_prefixes.is_empty() {
            self.config.instrument.comment_prefixes
        } else {
            cli.comment_prefixes.clone()
        };

        WorkerSettings {
            cache_dir,
            usage: cli.usage.unwrap_or_default(),
            comment_prefixes,
        }
    }
}
