//! Istanbul-compatible per-file coverage records.
//!
//! Site ids are decimal strings assigned in insertion order, which keeps the JSON identical to
//! what istanbul-based reporters expect to merge.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}

impl Range {
    /// A range covering columns `start_col..end_col` of a single line.
    pub fn on_line(line: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            start: Location {
                line,
                column: start_col,
            },
            end: Location {
                line,
                column: end_col,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMapping {
    pub name: String,
    pub decl: Range,
    pub loc: Range,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMapping {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Range,
    pub locations: Vec<Range>,
    pub line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub path: String,

    #[serde(default)]
    pub statement_map: BTreeMap<String, Range>,

    #[serde(default)]
    pub fn_map: BTreeMap<String, FunctionMapping>,

    #[serde(default)]
    pub branch_map: BTreeMap<String, BranchMapping>,

    #[serde(default)]
    pub s: BTreeMap<String, u64>,

    #[serde(default)]
    pub f: BTreeMap<String, u64>,

    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,
}

impl FileCoverage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn add_statement(&mut self, range: Range) -> String {
        let id = self.statement_map.len().to_string();
        self.statement_map.insert(id.clone(), range);
        self.s.insert(id.clone(), 0);
        id
    }

    /// Zero every counter while keeping the site maps.
    ///
    /// Hit tables are rebuilt from the site maps so every site has exactly one entry.
    pub fn reset_hits(&mut self) {
        self.s = self.statement_map.keys().map(|k| (k.clone(), 0)).collect();
        self.f = self.fn_map.keys().map(|k| (k.clone(), 0)).collect();
        self.b = self
            .branch_map
            .iter()
            .map(|(k, m)| (k.clone(), vec![0; m.locations.len()]))
            .collect();
    }

    pub fn is_zeroed(&self) -> bool {
        self.s.values().all(|&n| n == 0)
            && self.f.values().all(|&n| n == 0)
            && self.b.values().flatten().all(|&n| n == 0)
    }

    pub fn summary(&self) -> CoverageCounts {
        CoverageCounts {
            statements: self.statement_map.len() as u64,
            functions: self.fn_map.len() as u64,
            branches: self.branch_map.values().map(|m| m.locations.len() as u64).sum(),
        }
    }
}

/// Number of instrumented sites of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub statements: u64,
    pub functions: u64,
    pub branches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileCoverage {
        let mut cov = FileCoverage::new("/r/src/a.ts");
        cov.add_statement(Range::on_line(1, 0, 10));
        cov.add_statement(Range::on_line(2, 0, 4));
        cov.fn_map.insert(
            "0".to_string(),
            FunctionMapping {
                name: "main".to_string(),
                decl: Range::on_line(1, 9, 13),
                loc: Range::on_line(1, 0, 10),
                line: 1,
            },
        );
        cov.branch_map.insert(
            "0".to_string(),
            BranchMapping {
                kind: "if".to_string(),
                loc: Range::on_line(2, 0, 4),
                locations: vec![Range::on_line(2, 0, 2), Range::on_line(2, 2, 4)],
                line: 2,
            },
        );
        cov.reset_hits();
        cov
    }

    #[test]
    fn site_ids_are_sequential() {
        let cov = sample();
        assert_eq!(cov.statement_map.keys().collect::<Vec<_>>(), vec!["0", "1"]);
        assert_eq!(cov.b["0"], vec![0, 0]);
    }

    #[test]
    fn reset_hits_zeroes_and_fills_missing_entries() {
        let mut cov = sample();
        cov.s.insert("0".to_string(), 7);
        cov.f.clear();
        cov.b.insert("0".to_string(), vec![3]);
        assert!(!cov.is_zeroed());

        cov.reset_hits();
        assert!(cov.is_zeroed());
        assert_eq!(cov.f.len(), 1);
        assert_eq!(cov.b["0"], vec![0, 0]);
    }

    #[test]
    fn serializes_with_istanbul_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("statementMap").is_some());
        assert!(json.get("fnMap").is_some());
        assert_eq!(json["branchMap"]["0"]["type"], "if");
        assert_eq!(json["s"]["1"], 0);
    }

    #[test]
    fn summary_counts_branch_arms() {
        let counts = sample().summary();
        assert_eq!(
            counts,
            CoverageCounts {
                statements: 2,
                functions: 1,
                branches: 2
            }
        );
    }
}
