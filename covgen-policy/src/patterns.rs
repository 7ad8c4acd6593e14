use glob::{MatchOptions, Pattern};
use regex::Regex;
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled glob list with `!` negation.
///
/// Patterns that fail to compile are dropped, so they never match anything.
#[derive(Debug, Clone, Default)]
pub(crate) struct GlobList {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl GlobList {
    pub(crate) fn compile(patterns: &[String]) -> Self {
        let mut out = Self::default();
        for raw in patterns {
            let (negated, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            match Pattern::new(body) {
                Ok(p) if negated => out.exclude.push(p),
                Ok(p) => out.include.push(p),
                Err(e) => debug!(pattern = %raw, error = %e, "dropping malformed glob"),
            }
        }
        out
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// True when `text` matches some positive pattern and no negated one.
    pub(crate) fn matches(&self, text: &str) -> bool {
        self.include
            .iter()
            .any(|p| p.matches_with(text, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(text, MATCH_OPTIONS))
    }
}

/// Compiled regex list; malformed entries are dropped.
#[derive(Debug, Clone, Default)]
pub(crate) struct RegexList(Vec<Regex>);

impl RegexList {
    pub(crate) fn compile(patterns: &[String]) -> Self {
        let mut out = Vec::with_capacity(patterns.len());
        for raw in patterns {
            match Regex::new(raw) {
                Ok(re) => out.push(re),
                Err(e) => debug!(pattern = %raw, error = %e, "dropping malformed regex"),
            }
        }
        Self(out)
    }

    pub(crate) fn any_match(&self, text: &str) -> bool {
        self.0.iter().any(|re| re.is_match(text))
    }
}
