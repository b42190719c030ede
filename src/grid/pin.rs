//! Pinned row snapshots

use crate::error::{GridError, GridResult};

/// A copy of a row's values taken when it was pinned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedRow {
    /// Absolute row index in the result set
    pub row: usize,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinChange {
    Pinned,
    Unpinned,
}

#[derive(Debug, Clone)]
pub struct PinnedRows {
    max: usize,
    rows: Vec<PinnedRow>,
}

impl PinnedRows {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            rows: Vec::new(),
        }
    }

    /// Unpin `row` if pinned, otherwise snapshot `values`.
    /// At the cap, returns `PinLimit` and leaves the set untouched.
    pub fn toggle(&mut self, row: usize, values: &[String]) -> GridResult<PinChange> {
        if let Some(pos) = self.rows.iter().position(|p| p.row == row) {
            self.rows.remove(pos);
            return Ok(PinChange::Unpinned);
        }
        if self.rows.len() >= self.max {
            return Err(GridError::PinLimit { max: self.max });
        }
        self.rows.push(PinnedRow {
            row,
            values: values.to_vec(),
        });
        Ok(PinChange::Pinned)
    }

    pub fn is_pinned(&self, row: usize) -> bool {
        self.rows.iter().any(|p| p.row == row)
    }

    pub fn rows(&self) -> &[PinnedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
