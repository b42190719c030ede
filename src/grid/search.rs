//! Search within the loaded row window

/// Position of a search hit in the loaded window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPos {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    matches: Vec<MatchPos>,
    active: Option<usize>,
}

impl SearchState {
    /// Case-insensitive substring scan in row-major order
    pub fn run(&mut self, query: &str, rows: &[Vec<String>]) {
        self.query = query.to_string();
        self.matches.clear();
        self.active = None;
        if query.is_empty() {
            return;
        }
        let needle = query.to_lowercase();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if contains_ignore_case(value, &needle) {
                    self.matches.push(MatchPos { row: r, col: c });
                }
            }
        }
    }

    /// Select the first match at or after `from` (row-major), wrapping
    pub fn activate_from(&mut self, from: MatchPos) -> Option<MatchPos> {
        if self.matches.is_empty() {
            return None;
        }
        let idx = self
            .matches
            .iter()
            .position(|m| (m.row, m.col) >= (from.row, from.col))
            .unwrap_or(0);
        self.active = Some(idx);
        Some(self.matches[idx])
    }

    pub fn next(&mut self) -> Option<MatchPos> {
        if self.matches.is_empty() {
            return None;
        }
        let idx = match self.active {
            Some(i) => (i + 1) % self.matches.len(),
            None => 0,
        };
        self.active = Some(idx);
        Some(self.matches[idx])
    }

    pub fn prev(&mut self) -> Option<MatchPos> {
        if self.matches.is_empty() {
            return None;
        }
        let idx = match self.active {
            Some(0) | None => self.matches.len() - 1,
            Some(i) => i - 1,
        };
        self.active = Some(idx);
        Some(self.matches[idx])
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[MatchPos] {
        &self.matches
    }

    /// Zero-based index of the active match
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn is_match(&self, row: usize, col: usize) -> bool {
        self.matches
            .binary_search_by(|m| (m.row, m.col).cmp(&(row, col)))
            .is_ok()
    }
}

// `needle` must already be lowercase
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if haystack.is_ascii() && needle.is_ascii() {
        return haystack
            .as_bytes()
            .windows(needle.len())
            .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()));
    }
    haystack.to_lowercase().contains(needle)
}
