//! Instrumentation policy: decide whether one file must be instrumented for coverage.
//!
//! The decision is pure. Patterns are compiled once per [`InstrumentationPolicy`] and malformed
//! ones never match, so configuration mistakes narrow coverage instead of failing the run.

mod patterns;

use camino::{Utf8Path, Utf8PathBuf};
use covgen_types::config::{CoverageProvider, GlobalConfig, ProjectConfig};
use covgen_types::context::ReporterContext;
use patterns::{GlobList, RegexList};
use std::collections::{BTreeSet, HashSet};

/// The scoping inputs of the decision: the coverage fields of [`GlobalConfig`] plus the
/// changed-files scope of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShouldInstrumentOptions {
    pub collect_coverage: bool,
    pub collect_coverage_from: Option<Vec<String>>,
    pub collect_coverage_only_from: Option<BTreeSet<Utf8PathBuf>>,
    pub coverage_provider: CoverageProvider,
    pub changed_files: Option<HashSet<Utf8PathBuf>>,
    pub sources_related_to_tests_in_changed_files: Option<HashSet<Utf8PathBuf>>,
}

impl ShouldInstrumentOptions {
    pub fn new(global: &GlobalConfig, context: ReporterContext) -> Self {
        Self {
            collect_coverage: global.collect_coverage,
            collect_coverage_from: global.collect_coverage_from.clone(),
            collect_coverage_only_from: global.collect_coverage_only_from.clone(),
            coverage_provider: global.coverage_provider,
            changed_files: context.changed_files,
            sources_related_to_tests_in_changed_files: context
                .sources_related_to_tests_in_changed_files,
        }
    }
}

/// A compiled instrumentation decision for one project and one run.
#[derive(Debug, Clone)]
pub struct InstrumentationPolicy {
    options: ShouldInstrumentOptions,
    root_dir: Utf8PathBuf,
    collect_from: Option<GlobList>,
    force_match: GlobList,
    test_match: GlobList,
    test_regex: RegexList,
    test_path_ignore: RegexList,
    coverage_path_ignore: RegexList,
    setup_files: HashSet<Utf8PathBuf>,
    global_setup: Option<Utf8PathBuf>,
    global_teardown: Option<Utf8PathBuf>,
}

impl InstrumentationPolicy {
    pub fn new(options: ShouldInstrumentOptions, project: &ProjectConfig) -> Self {
        let collect_from = options
            .collect_coverage_from
            .as_deref()
            .map(GlobList::compile);
        Self {
            collect_from,
            root_dir: project.root_dir.clone(),
            force_match: GlobList::compile(&project.force_coverage_match),
            test_match: GlobList::compile(&project.test_match),
            test_regex: RegexList::compile(&project.test_regex),
            test_path_ignore: RegexList::compile(&project.test_path_ignore_patterns),
            coverage_path_ignore: RegexList::compile(&project.coverage_path_ignore_patterns),
            setup_files: project
                .setup_files
                .iter()
                .chain(project.setup_files_after_env.iter())
                .cloned()
                .collect(),
            global_setup: project.global_setup.clone(),
            global_teardown: project.global_teardown.clone(),
            options,
        }
    }

    pub fn options(&self) -> &ShouldInstrumentOptions {
        &self.options
    }

    pub fn should_instrument(&self, path: &Utf8Path) -> bool {
        let opts = &self.options;
        if !opts.collect_coverage {
            return false;
        }
        if opts.coverage_provider == CoverageProvider::NativeRuntime {
            return false;
        }

        let full = normalize(path.as_str());
        if !self.force_match.is_empty() && self.force_match.matches(&full) {
            return true;
        }

        let in_scope = match &opts.collect_coverage_only_from {
            Some(only) if !only.is_empty() => only.contains(path),
            _ => match &self.collect_from {
                Some(globs) => {
                    globs.matches(&self.root_relative(path)) && !self.is_standard_exclusion(path)
                }
                None => true,
            },
        };
        if !in_scope {
            return false;
        }

        match &opts.changed_files {
            Some(changed) => {
                changed.contains(path)
                    || opts
                        .sources_related_to_tests_in_changed_files
                        .as_ref()
                        .is_some_and(|related| related.contains(path))
            }
            None => true,
        }
    }

    fn root_relative(&self, path: &Utf8Path) -> String {
        let full = normalize(path.as_str());
        let root = normalize(self.root_dir.as_str());
        match full
            .strip_prefix(root.trim_end_matches('/'))
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(rel) => rel.to_string(),
            None => full,
        }
    }

    fn is_standard_exclusion(&self, path: &Utf8Path) -> bool {
        let full = normalize(path.as_str());
        self.is_test_file(&full)
            || self.coverage_path_ignore.any_match(&full)
            || self.setup_files.contains(path)
            || self.global_setup.as_deref() == Some(path)
            || self.global_teardown.as_deref() == Some(path)
            || full.split('/').any(|segment| segment == "__mocks__")
            || full.ends_with(".json")
    }

    fn is_test_file(&self, full: &str) -> bool {
        if self.test_path_ignore.any_match(full) {
            return false;
        }
        self.test_regex.any_match(full) || self.test_match.matches(full)
    }
}

/// One-shot form of [`InstrumentationPolicy::should_instrument`].
pub fn should_instrument(
    path: &Utf8Path,
    options: &ShouldInstrumentOptions,
    project: &ProjectConfig,
) -> bool {
    InstrumentationPolicy::new(options.clone(), project).should_instrument(path)
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}
