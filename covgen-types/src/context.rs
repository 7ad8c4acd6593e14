use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Changed-files scoping as it crosses the process boundary: plain ordered sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReporterContextSerialized {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<Vec<Utf8PathBuf>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_related_to_tests_in_changed_files: Option<Vec<Utf8PathBuf>>,
}

impl ReporterContextSerialized {
    /// Convert the sequences into lookup sets. Done once per job.
    pub fn into_context(self) -> ReporterContext {
        ReporterContext {
            changed_files: self.changed_files.map(|v| v.into_iter().collect()),
            sources_related_to_tests_in_changed_files: self
                .sources_related_to_tests_in_changed_files
                .map(|v| v.into_iter().collect()),
        }
    }
}

/// Changed-files scoping for one run. `None` means "not scoped".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterContext {
    pub changed_files: Option<HashSet<Utf8PathBuf>>,
    pub sources_related_to_tests_in_changed_files: Option<HashSet<Utf8PathBuf>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_sequences_stay_unscoped() {
        let ctx = ReporterContextSerialized::default().into_context();
        assert!(ctx.changed_files.is_none());
        assert!(ctx.sources_related_to_tests_in_changed_files.is_none());
    }

    #[test]
    fn duplicate_paths_collapse_into_one_entry() {
        let ser: ReporterContextSerialized = serde_json::from_value(serde_json::json!({
            "changedFiles": ["/r/src/a.ts", "/r/src/a.ts"],
            "sourcesRelatedToTestsInChangedFiles": []
        }))
        .unwrap();
        let ctx = ser.into_context();
        assert_eq!(ctx.changed_files.as_ref().map(HashSet::len), Some(1));
        assert_eq!(
            ctx.sources_related_to_tests_in_changed_files
                .as_ref()
                .map(HashSet::len),
            Some(0)
        );
    }
}
