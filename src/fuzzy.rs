//! Fuzzy label matching
//!
//! Thin wrapper over the Skim scoring algorithm, shared by tree filtering and
//! any other "type to narrow" list.

use fuzzy_matcher::FuzzyMatcher as _;
use fuzzy_matcher::skim::SkimMatcherV2;

/// A successful match: higher scores are better
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub score: i64,
    /// Char positions in the label that matched the query
    pub indices: Vec<usize>,
}

pub struct FuzzyMatcher {
    matcher: SkimMatcherV2,
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Score `query` against `label`. An empty query matches everything with score 0.
    pub fn score(&self, query: &str, label: &str) -> Option<i64> {
        if query.is_empty() {
            return Some(0);
        }
        self.matcher.fuzzy_match(label, query)
    }

    /// Score plus the matched character positions, for highlighting
    pub fn match_indices(&self, query: &str, label: &str) -> Option<FuzzyMatch> {
        if query.is_empty() {
            return Some(FuzzyMatch {
                score: 0,
                indices: Vec::new(),
            });
        }
        self.matcher
            .fuzzy_indices(label, query)
            .map(|(score, indices)| FuzzyMatch { score, indices })
    }

    /// Keep the items whose label matches, best score first.
    /// Ties keep their input order.
    pub fn rank<'a, T, I>(&self, query: &str, items: I) -> Vec<(T, i64)>
    where
        I: IntoIterator<Item = (T, &'a str)>,
    {
        let mut scored: Vec<(T, i64)> = items
            .into_iter()
            .filter_map(|(item, label)| self.score(query, label).map(|s| (item, s)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}
