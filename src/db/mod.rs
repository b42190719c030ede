//! Database abstraction layer
//!
//! [`DataSource`] is everything the browser needs from a backend. Methods
//! return `Send` futures so background tasks can run them on the tokio
//! runtime while the UI loop keeps going.

pub mod postgres;
pub mod registry;
pub mod types;

pub use registry::ConnectionRegistry;
pub use types::{
    ChildrenRequest, PageData, PageRequest, QueryOutput, SearchRequest, SortDirection, SortSpec,
};

use crate::error::DbResult;
use crate::tree::NodeDescriptor;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A connected backend the browser can read from
pub trait DataSource: Send + Sync + 'static {
    /// Databases on the server, flagging the one this session is attached to
    fn load_databases(&self) -> impl Future<Output = DbResult<Vec<NodeDescriptor>>> + Send;

    fn load_schemas(&self, database: &str) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Children of a catalog object, in display order
    fn load_children(
        &self,
        request: &ChildrenRequest,
    ) -> impl Future<Output = DbResult<Vec<NodeDescriptor>>> + Send;

    /// One page of rows plus the relation's total row count
    fn load_page(&self, request: &PageRequest) -> impl Future<Output = DbResult<PageData>> + Send;

    /// Run an ad-hoc statement. Resolves to `DbError::Cancelled` once `cancel` fires.
    fn execute_query(
        &self,
        sql: &str,
        cancel: CancellationToken,
    ) -> impl Future<Output = DbResult<QueryOutput>> + Send;

    /// Rows anywhere in the table whose text contains the query
    fn search_table(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = DbResult<PageData>> + Send;
}

/// Double-quote an identifier for interpolation into SQL
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
