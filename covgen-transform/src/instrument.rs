//! Secondary instrumentation and initial-coverage extraction.
//!
//! Instrumented code carries its zero-valued coverage map on one trailing line:
//!
//! ```text
//! //# covgen-coverage={"path":"...","statementMap":{...},...}
//! ```
//!
//! Transformers that instrument on their own (`can_instrument`) must emit the same line.

use crate::transformer::TransformerIdentity;
use anyhow::Context;
use camino::Utf8Path;
use covgen_types::coverage::{FileCoverage, Range};
use covgen_types::transform::TransformedSource;

pub const COVERAGE_PRAGMA: &str = "//# covgen-coverage=";

/// Line prefixes [`LineInstrumenter::default`] treats as comments.
pub const DEFAULT_COMMENT_PREFIXES: &[&str] = &["//", "/*", "*", "#"];

/// Adds coverage counters to already-transformed code.
pub trait Instrumenter: Send + Sync {
    fn identity(&self) -> TransformerIdentity;

    fn instrument(
        &self,
        input: &TransformedSource,
        path: &Utf8Path,
    ) -> anyhow::Result<TransformedSource>;
}

/// Append the coverage pragma to `code`.
pub fn embed_initial_coverage(code: &str, coverage: &FileCoverage) -> anyhow::Result<String> {
    let json = serde_json::to_string(coverage).context("encode initial coverage")?;
    let mut out = String::with_capacity(code.len() + json.len() + COVERAGE_PRAGMA.len() + 2);
    out.push_str(code);
    if !code.is_empty() && !code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(COVERAGE_PRAGMA);
    out.push_str(&json);
    out.push('\n');
    Ok(out)
}

/// Read the coverage map embedded by an instrumenter, if any. The last pragma wins.
pub fn read_initial_coverage(code: &str) -> Option<FileCoverage> {
    code.lines()
        .rev()
        .find_map(|line| line.trim_start().strip_prefix(COVERAGE_PRAGMA))
        .and_then(|json| serde_json::from_str(json).ok())
}

/// Static, line-granularity instrumenter.
///
/// Every non-blank line that is not a pure comment becomes one statement site. The code itself
/// is left unchanged apart from the trailing pragma, so source maps stay valid.
#[derive(Debug, Clone)]
pub struct LineInstrumenter {
    comment_prefixes: Vec<String>,
}

impl Default for LineInstrumenter {
    fn default() -> Self {
        Self::new(DEFAULT_COMMENT_PREFIXES.iter().copied())
    }
}

impl LineInstrumenter {
    pub fn new<I, S>(comment_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            comment_prefixes: comment_prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn coverage_for(&self, code: &str, path: &Utf8Path) -> FileCoverage {
        let mut coverage = FileCoverage::new(path.as_str());
        for (idx, line) in code.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with(COVERAGE_PRAGMA)
                || self
                    .comment_prefixes
                    .iter()
                    .any(|p| trimmed.starts_with(p.as_str()))
            {
                continue;
            }
            let indent = line.chars().take_while(|c| c.is_whitespace()).count() as u32;
            let width = line.trim_end().chars().count() as u32;
            coverage.add_statement(Range::on_line(idx as u32 + 1, indent, width));
        }
        coverage
    }
}

impl Instrumenter for LineInstrumenter {
    fn identity(&self) -> TransformerIdentity {
        let mut prefixes = self.comment_prefixes.clone();
        prefixes.sort();
        TransformerIdentity::new(
            "covgen-line-instrumenter",
            format!("{}+{}", env!("CARGO_PKG_VERSION"), prefixes.join(" ")),
        )
    }

    fn instrument(
        &self,
        input: &TransformedSource,
        path: &Utf8Path,
    ) -> anyhow::Result<TransformedSource> {
        let coverage = self.coverage_for(&input.code, path);
        Ok(TransformedSource {
            code: embed_initial_coverage(&input.code, &coverage)?,
            map: input.map.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "// header\nexport const a = 1;\n\n  if (a) {\n    run();\n  }\n";

    #[test]
    fn one_statement_per_code_line() {
        let cov = LineInstrumenter::default().coverage_for(SOURCE, Utf8Path::new("/r/a.ts"));
        let lines: Vec<u32> = cov.statement_map.values().map(|r| r.start.line).collect();
        assert_eq!(lines, vec![2, 4, 5, 6]);
        assert_eq!(cov.statement_map["1"], Range::on_line(4, 2, 10));
        assert!(cov.is_zeroed());
    }

    #[test]
    fn instrumented_code_round_trips_coverage() {
        let inst = LineInstrumenter::default();
        let out = inst
            .instrument(&TransformedSource::code_only(SOURCE), Utf8Path::new("/r/a.ts"))
            .unwrap();
        assert!(out.code.starts_with(SOURCE));

        let cov = read_initial_coverage(&out.code).unwrap();
        assert_eq!(cov.path, "/r/a.ts");
        assert_eq!(cov.statement_map.len(), 4);
    }

    #[test]
    fn reinstrumenting_ignores_previous_pragma() {
        let inst = LineInstrumenter::default();
        let once = inst
            .instrument(&TransformedSource::code_only(SOURCE), Utf8Path::new("/r/a.ts"))
            .unwrap();
        let twice = inst.instrument(&once, Utf8Path::new("/r/a.ts")).unwrap();
        assert_eq!(read_initial_coverage(&twice.code).unwrap().statement_map.len(), 4);
    }

    #[test]
    fn code_without_pragma_has_no_coverage() {
        assert!(read_initial_coverage(SOURCE).is_none());
        assert!(read_initial_coverage("//# covgen-coverage={not json").is_none());
    }

    #[test]
    fn empty_file_gets_empty_map() {
        let out = LineInstrumenter::default()
            .instrument(&TransformedSource::code_only(""), Utf8Path::new("/r/e.ts"))
            .unwrap();
        let cov = read_initial_coverage(&out.code).unwrap();
        assert!(cov.statement_map.is_empty());
    }

    #[test]
    fn identity_tracks_comment_prefixes() {
        let a = LineInstrumenter::new(["//"]).identity();
        let b = LineInstrumenter::new(["//", "#"]).identity();
        assert_ne!(a, b);
    }
}
