//! Background task bodies
//!
//! Each task resolves the active source, does one piece of I/O and reports
//! back with a single [`AppEvent`]. Tasks never touch UI state. A closed
//! mailbox means the UI has exited, so send failures are ignored.

use super::message::AppEvent;
use crate::cache::RowCache;
use crate::db::types::{ChildrenRequest, PageRequest, SearchRequest};
use crate::db::{ConnectionRegistry, DataSource};
use crate::error::DbResult;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

pub type Mailbox = UnboundedSender<AppEvent>;

pub(crate) async fn load_databases<S: DataSource>(
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    generation: u64,
) {
    let result = match registry.active().await {
        Ok(source) => source.load_databases().await,
        Err(e) => Err(e),
    };
    tracing::debug!(generation, ok = result.is_ok(), "databases loaded");
    let _ = tx.send(AppEvent::DatabasesLoaded { generation, result });
}

pub(crate) async fn load_children<S: DataSource>(
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    generation: u64,
    node_id: String,
    request: ChildrenRequest,
) {
    let result = match registry.active().await {
        Ok(source) => source.load_children(&request).await,
        Err(e) => Err(e),
    };
    tracing::debug!(node = %node_id, ok = result.is_ok(), "children loaded");
    let _ = tx.send(AppEvent::NodeChildrenLoaded {
        generation,
        node_id,
        result,
    });
}

/// Fetch a page and write its rows into the tab's cache
async fn fetch_page<S: DataSource>(
    registry: &ConnectionRegistry<S>,
    request: &PageRequest,
    cache: &RowCache,
) -> DbResult<crate::db::PageData> {
    let source = registry.active().await?;
    let page = source.load_page(request).await?;
    cache.set_range(request.offset, &page.rows);
    Ok(page)
}

pub(crate) async fn load_table_data<S: DataSource>(
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    tab_id: usize,
    generation: u64,
    request: PageRequest,
    cache: Arc<RowCache>,
) {
    let result = fetch_page(&registry, &request, &cache).await;
    tracing::debug!(
        tab_id,
        offset = request.offset,
        limit = request.limit,
        ok = result.is_ok(),
        "page loaded"
    );
    let _ = tx.send(AppEvent::TableDataLoaded {
        tab_id,
        generation,
        offset: request.offset,
        result,
    });
}

pub(crate) async fn prefetch<S: DataSource>(
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    tab_id: usize,
    generation: u64,
    request: PageRequest,
    cache: Arc<RowCache>,
) {
    let result = fetch_page(&registry, &request, &cache).await;
    let _ = tx.send(AppEvent::PrefetchComplete {
        tab_id,
        generation,
        offset: request.offset,
        result,
    });
}

pub(crate) async fn execute_query<S: DataSource>(
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    tab_id: usize,
    query_id: u64,
    sql: String,
    cancel: CancellationToken,
) {
    let result = match registry.active().await {
        Ok(source) => source.execute_query(&sql, cancel).await,
        Err(e) => Err(e),
    };
    tracing::debug!(tab_id, query_id, ok = result.is_ok(), "query finished");
    let _ = tx.send(AppEvent::QueryResult {
        tab_id,
        query_id,
        sql,
        result,
    });
}

pub(crate) async fn search_table<S: DataSource>(
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    tab_id: usize,
    generation: u64,
    request: SearchRequest,
) {
    let result = match registry.active().await {
        Ok(source) => source.search_table(&request).await,
        Err(e) => Err(e),
    };
    let _ = tx.send(AppEvent::SearchResult {
        tab_id,
        generation,
        query: request.query,
        result,
    });
}
