//! Request and result shapes exchanged with data sources
//!
//! Values cross this boundary as display text; `NULL` arrives as the literal
//! string `"NULL"`.

use crate::tree::NodeKind;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Requested ordering. Applied by the data source, never locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
    pub nulls_first: bool,
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        };
        write!(f, "{}{}", self.column, arrow)?;
        if self.nulls_first {
            write!(f, " nulls first")?;
        }
        Ok(())
    }
}

/// One page of a table or view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub database: String,
    pub schema: String,
    pub table: String,
    pub offset: usize,
    pub limit: usize,
    pub sort: Option<SortSpec>,
    /// Row count already known from an earlier page; the source skips counting
    pub known_total: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows in the whole relation, not just this page
    pub total_rows: usize,
}

/// Where in the catalog a children load is rooted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildrenRequest {
    pub kind: NodeKind,
    pub database: String,
    pub schema: Option<String>,
    /// Table, view or type name for column/index/trigger listings
    pub relation: Option<String>,
}

/// Result of an ad-hoc statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub rows_affected: u64,
    pub duration: Duration,
}

/// Table-wide text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub database: String,
    pub schema: String,
    pub table: String,
    pub query: String,
    pub limit: usize,
}
