//! Turning actions into background work
//!
//! The UI loop owns all tree and grid state and mutates it only while
//! handling an [`AppEvent`]. Anything that needs I/O comes back out as an
//! [`Action`]; the [`Dispatcher`] spawns a task for it, and the task's only
//! way back in is the mailbox.
//!
//! One statement runs at a time. Dispatching a new one (or `CancelQuery`)
//! fires the previous statement's cancellation token first, so its eventual
//! `DbError::Cancelled` result is recognised and dropped.

pub mod message;
pub mod tasks;

pub use message::{Action, AppEvent};
pub use tasks::Mailbox;

use crate::db::{ConnectionRegistry, DataSource};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Dispatcher<S> {
    registry: Arc<ConnectionRegistry<S>>,
    tx: Mailbox,
    query_cancel: Option<CancellationToken>,
}

impl<S: DataSource> Dispatcher<S> {
    pub fn new(registry: Arc<ConnectionRegistry<S>>, tx: Mailbox) -> Self {
        Self {
            registry,
            tx,
            query_cancel: None,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry<S>> {
        &self.registry
    }

    /// Whether a statement's token is still armed
    pub fn query_in_flight(&self) -> bool {
        self.query_cancel
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Start the work `action` asks for. Returns the task handle, if any.
    pub fn dispatch(&mut self, action: Action) -> Option<JoinHandle<()>> {
        let registry = Arc::clone(&self.registry);
        let tx = self.tx.clone();
        match action {
            Action::LoadDatabases { generation } => {
                Some(spawn(tasks::load_databases(registry, tx, generation)))
            }
            Action::LoadNodeChildren {
                generation,
                node_id,
                request,
            } => {
                tracing::debug!(node = %node_id, "loading children");
                Some(spawn(tasks::load_children(
                    registry, tx, generation, node_id, request,
                )))
            }
            Action::LoadTableData {
                tab_id,
                generation,
                request,
                cache,
            } => Some(spawn(tasks::load_table_data(
                registry, tx, tab_id, generation, request, cache,
            ))),
            Action::PrefetchData {
                tab_id,
                generation,
                request,
                cache,
            } => {
                tracing::debug!(tab_id, offset = request.offset, "prefetching");
                Some(spawn(tasks::prefetch(
                    registry, tx, tab_id, generation, request, cache,
                )))
            }
            Action::ExecuteQuery {
                tab_id,
                query_id,
                sql,
            } => {
                self.cancel_query();
                let token = CancellationToken::new();
                self.query_cancel = Some(token.clone());
                tracing::debug!(tab_id, query_id, "executing query");
                Some(spawn(tasks::execute_query(
                    registry, tx, tab_id, query_id, sql, token,
                )))
            }
            Action::CancelQuery => {
                self.cancel_query();
                None
            }
            Action::SearchTable {
                tab_id,
                generation,
                request,
            } => Some(spawn(tasks::search_table(
                registry, tx, tab_id, generation, request,
            ))),
            Action::Quit | Action::None => None,
        }
    }

    fn cancel_query(&mut self) {
        if let Some(token) = self.query_cancel.take() {
            token.cancel();
        }
    }
}

fn spawn<F>(task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(task)
}
