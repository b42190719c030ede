//! Messages into and out of the UI loop
//!
//! [`AppEvent`] is everything the loop can receive: terminal input and the
//! completion of background work. [`Action`] is what handling an event asks
//! for next. Every completion carries enough identity (tree generation, node
//! id, tab id, load generation, query id) for the handler to recognise it as
//! stale and drop it.

use crate::cache::RowCache;
use crate::db::types::{ChildrenRequest, PageData, PageRequest, QueryOutput, SearchRequest};
use crate::error::DbResult;
use crate::tree::NodeDescriptor;
use crossterm::event::KeyEvent;
use std::sync::Arc;

/// Application events from the event loop
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event
    Key(KeyEvent),
    /// Terminal resize event
    Resize(u16, u16),
    /// Periodic wake-up; expires pending motions
    Tick,

    /// First tree level for a connection
    DatabasesLoaded {
        generation: u64,
        result: DbResult<Vec<NodeDescriptor>>,
    },
    /// Lazy children load finished
    NodeChildrenLoaded {
        generation: u64,
        node_id: String,
        result: DbResult<Vec<NodeDescriptor>>,
    },
    /// Foreground page load finished
    TableDataLoaded {
        tab_id: usize,
        generation: u64,
        offset: usize,
        result: DbResult<PageData>,
    },
    /// Speculative page load finished
    PrefetchComplete {
        tab_id: usize,
        generation: u64,
        offset: usize,
        result: DbResult<PageData>,
    },
    /// Ad-hoc statement finished
    QueryResult {
        tab_id: usize,
        query_id: u64,
        sql: String,
        result: DbResult<QueryOutput>,
    },
    /// Table-wide search finished
    SearchResult {
        tab_id: usize,
        generation: u64,
        query: String,
        result: DbResult<PageData>,
    },

    /// Expand or collapse a node by identity
    TreeNodeExpanded { node_id: String, expanded: bool },
    /// Activate a node: relations open in the grid, containers toggle
    TreeNodeSelected { node_id: String },

    /// Background database connection lost
    ConnectionLost(String),
}

/// Actions returned by event handlers for the dispatcher to execute
#[derive(Debug)]
pub enum Action {
    LoadDatabases {
        generation: u64,
    },
    LoadNodeChildren {
        generation: u64,
        node_id: String,
        request: ChildrenRequest,
    },
    LoadTableData {
        tab_id: usize,
        generation: u64,
        request: PageRequest,
        cache: Arc<RowCache>,
    },
    PrefetchData {
        tab_id: usize,
        generation: u64,
        request: PageRequest,
        cache: Arc<RowCache>,
    },
    ExecuteQuery {
        tab_id: usize,
        query_id: u64,
        sql: String,
    },
    CancelQuery,
    SearchTable {
        tab_id: usize,
        generation: u64,
        request: SearchRequest,
    },
    Quit,
    None,
}

impl Action {
    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}
