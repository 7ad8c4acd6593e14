use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How coverage data is obtained for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageProvider {
    /// Counters are injected into the source before it runs.
    #[default]
    #[serde(alias = "babel")]
    SourceInstrumentation,
    /// The runtime records coverage itself; sources are never instrumented.
    #[serde(alias = "v8")]
    NativeRuntime,
}

/// Run-wide configuration shared by every project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    pub collect_coverage: bool,

    /// Root-relative glob patterns. A leading `!` negates a pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_coverage_from: Option<Vec<String>>,

    /// Exact file paths. When non-empty this replaces `collect_coverage_from` entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_coverage_only_from: Option<BTreeSet<Utf8PathBuf>>,

    pub coverage_provider: CoverageProvider,
}

/// Per-project configuration. Read-only for the whole of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub name: String,
    pub root_dir: Utf8PathBuf,

    /// Globs identifying test files, matched against the full path.
    pub test_match: Vec<String>,

    /// Regexes identifying test files, matched against the full path.
    pub test_regex: Vec<String>,

    /// Regexes that exempt a path from test-file detection.
    pub test_path_ignore_patterns: Vec<String>,

    /// Regexes excluding paths from coverage (dependency directories by default).
    pub coverage_path_ignore_patterns: Vec<String>,

    /// Globs that force instrumentation, even for test files.
    pub force_coverage_match: Vec<String>,

    pub setup_files: Vec<Utf8PathBuf>,
    pub setup_files_after_env: Vec<Utf8PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_setup: Option<Utf8PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_teardown: Option<Utf8PathBuf>,

    /// Ordered transformer selection; the first matching entry wins.
    pub transform: Vec<TransformEntry>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            root_dir: Utf8PathBuf::from("."),
            test_match: vec![
                "**/__tests__/**/*".to_string(),
                "**/*.test.*".to_string(),
                "**/*.spec.*".to_string(),
            ],
            test_regex: Vec::new(),
            test_path_ignore_patterns: vec!["/node_modules/".to_string()],
            coverage_path_ignore_patterns: vec!["/node_modules/".to_string()],
            force_coverage_match: Vec::new(),
            setup_files: Vec::new(),
            setup_files_after_env: Vec::new(),
            global_setup: None,
            global_teardown: None,
            transform: Vec::new(),
        }
    }
}

/// One `transform` entry: files matching `pattern` go through the named transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformEntry {
    /// Regex matched against the full file path.
    pub pattern: String,

    /// Registry name of the transformer.
    pub transformer: String,

    /// Opaque transformer-specific options, forwarded untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_accepts_host_aliases() {
        let p: CoverageProvider = serde_json::from_str("\"v8\"").unwrap();
        assert_eq!(p, CoverageProvider::NativeRuntime);
        let p: CoverageProvider = serde_json::from_str("\"babel\"").unwrap();
        assert_eq!(p, CoverageProvider::SourceInstrumentation);
        let p: CoverageProvider = serde_json::from_str("\"native-runtime\"").unwrap();
        assert_eq!(p, CoverageProvider::NativeRuntime);
    }

    #[test]
    fn global_config_uses_camel_case() {
        let json = serde_json::json!({
            "collectCoverage": true,
            "collectCoverageFrom": ["src/**"],
            "coverageProvider": "source-instrumentation"
        });
        let cfg: GlobalConfig = serde_json::from_value(json).unwrap();
        assert!(cfg.collect_coverage);
        assert_eq!(cfg.collect_coverage_from, Some(vec!["src/**".to_string()]));
        assert!(cfg.collect_coverage_only_from.is_none());
    }

    #[test]
    fn project_config_defaults_ignore_dependency_dirs() {
        let cfg: ProjectConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.coverage_path_ignore_patterns, vec!["/node_modules/"]);
        assert!(cfg.transform.is_empty());
    }
}
