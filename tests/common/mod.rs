//! Common test utilities and helpers
//!
//! An in-memory [`DataSource`] and a harness that runs the real
//! [`Dispatcher`] against it, so tests observe the same event flow the
//! terminal loop does.

#![allow(dead_code)]

use dbnav::app::App;
use dbnav::config::{ConnectionConfig, Settings, SslMode};
use dbnav::db::types::{ChildrenRequest, PageData, PageRequest, QueryOutput, SearchRequest};
use dbnav::db::{ConnectionRegistry, DataSource, SortDirection};
use dbnav::dispatch::{AppEvent, Dispatcher};
use dbnav::error::{DbError, DbResult};
use dbnav::tree::{NodeDescriptor, NodeKind, NodeMeta};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Statement that blocks until cancelled
pub const SLOW_QUERY: &str = "select pg_sleep(10)";

/// Catalog: databases `app` (active) and `postgres`, schema `public` with a
/// `users` table and an `active_users` view. Rows are `(id, user<id>)`.
pub struct FakeSource {
    pub total_rows: usize,
    pub page_delay: Duration,
    /// Schema whose children fail to load
    pub fail_schema: Option<String>,
    pub page_calls: AtomicUsize,
    /// Pages that had to count the relation
    pub count_calls: AtomicUsize,
    pub page_requests: Mutex<Vec<PageRequest>>,
}

impl FakeSource {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            page_delay: Duration::ZERO,
            fail_schema: None,
            page_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            page_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    fn row(id: usize) -> Vec<String> {
        vec![id.to_string(), format!("user{}", id)]
    }
}

impl DataSource for FakeSource {
    async fn load_databases(&self) -> DbResult<Vec<NodeDescriptor>> {
        Ok(vec![
            NodeDescriptor::new(NodeKind::Database, "app")
                .with_meta(NodeMeta::Database { active: true }),
            NodeDescriptor::new(NodeKind::Database, "postgres"),
        ])
    }

    async fn load_schemas(&self, _database: &str) -> DbResult<Vec<String>> {
        Ok(vec!["public".to_string()])
    }

    async fn load_children(&self, request: &ChildrenRequest) -> DbResult<Vec<NodeDescriptor>> {
        match request.kind {
            NodeKind::Database => Ok(vec![NodeDescriptor::new(NodeKind::Schema, "public")]),
            NodeKind::Schema => {
                if request.schema.is_some() && request.schema == self.fail_schema {
                    return Err(DbError::SchemaLoadFailed("permission denied".to_string()));
                }
                Ok(vec![
                    NodeDescriptor::new(NodeKind::Table, "users"),
                    NodeDescriptor::new(NodeKind::View, "active_users"),
                ])
            }
            _ => Ok(vec![
                NodeDescriptor::new(NodeKind::Column, "id"),
                NodeDescriptor::new(NodeKind::Column, "name"),
            ]),
        }
    }

    async fn load_page(&self, request: &PageRequest) -> DbResult<PageData> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page_requests.lock().push(request.clone());
        if request.known_total.is_none() {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
        }
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
        let descending = request
            .sort
            .as_ref()
            .is_some_and(|s| s.direction == SortDirection::Descending);
        let end = (request.offset + request.limit).min(self.total_rows);
        let rows = (request.offset..end)
            .map(|i| {
                let id = if descending { self.total_rows - 1 - i } else { i };
                Self::row(id)
            })
            .collect();
        Ok(PageData {
            columns: vec!["id".to_string(), "name".to_string()],
            rows,
            total_rows: self.total_rows,
        })
    }

    async fn execute_query(&self, sql: &str, cancel: CancellationToken) -> DbResult<QueryOutput> {
        if sql == SLOW_QUERY {
            return tokio::select! {
                _ = cancel.cancelled() => Err(DbError::Cancelled),
                _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(QueryOutput::default()),
            };
        }
        if sql.starts_with("select") {
            return Ok(QueryOutput {
                columns: vec!["one".to_string()],
                rows: vec![vec!["1".to_string()]],
                rows_affected: 1,
                duration: Duration::from_millis(1),
            });
        }
        Err(DbError::QueryFailed(format!("syntax error at or near \"{}\"", sql)))
    }

    async fn search_table(&self, request: &SearchRequest) -> DbResult<PageData> {
        let rows: Vec<Vec<String>> = (0..self.total_rows)
            .map(Self::row)
            .filter(|row| row.iter().any(|v| v.contains(&request.query)))
            .take(request.limit)
            .collect();
        let total_rows = rows.len();
        Ok(PageData {
            columns: vec!["id".to_string(), "name".to_string()],
            rows,
            total_rows,
        })
    }
}

/// Small pages so paging kicks in after a handful of rows
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.grid.page_size = 10;
    settings.grid.prefetch_threshold = 3;
    settings.grid.near_end_margin = 1;
    settings
}

pub struct Harness {
    pub app: App,
    pub dispatcher: Dispatcher<FakeSource>,
    pub source: Arc<FakeSource>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl Harness {
    /// Connect to `source` and let the initial tree load finish
    pub async fn start(source: FakeSource) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let source = registry.connect("fake", source).await;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut harness = Self {
            app: App::new(&test_settings()),
            dispatcher: Dispatcher::new(registry, tx),
            source,
            rx,
        };
        harness.send(AppEvent::Resize(120, 40));
        let action = harness.app.set_connection("fake");
        harness.dispatcher.dispatch(action);
        harness.settle().await;
        harness
    }

    /// Handle an event and dispatch whatever it asks for
    pub fn send(&mut self, event: AppEvent) {
        let action = self.app.handle_event(event).expect("event handled");
        self.dispatcher.dispatch(action);
    }

    pub fn key(&mut self, c: char) {
        self.send(AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
    }

    pub fn ctrl(&mut self, c: char) {
        self.send(AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)));
    }

    pub fn press(&mut self, code: KeyCode) {
        self.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.key(c);
        }
    }

    /// Feed completions back in until the mailbox stays quiet
    pub async fn settle(&mut self) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(300), self.rx.recv()).await
        {
            self.send(event);
        }
    }

    /// Expand `public` and open `users` in the active tab, without settling
    pub async fn open_users(&mut self) {
        self.send(AppEvent::TreeNodeExpanded {
            node_id: "db:app/schema:public".to_string(),
            expanded: true,
        });
        self.settle().await;
        self.send(AppEvent::TreeNodeSelected {
            node_id: "db:app/schema:public/table:users".to_string(),
        });
    }
}

/// Connection settings for the live PostgreSQL tests
pub fn test_connection_config() -> ConnectionConfig {
    ConnectionConfig {
        name: "integration-test".to_string(),
        host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: std::env::var("TEST_DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5433),
        database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
        username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        password: Some(
            std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
        ),
        ssl_mode: SslMode::Disable,
    }
}
