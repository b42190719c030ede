//! Named connections shared between the UI loop and background tasks
//!
//! Tasks only ever read (look up the active source and run against it).
//! Connecting and disconnecting are the rare writers.

use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Inner<S> {
    sources: HashMap<String, Arc<S>>,
    active: Option<String>,
}

pub struct ConnectionRegistry<S> {
    inner: RwLock<Inner<S>>,
}

impl<S> ConnectionRegistry<S> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                sources: HashMap::new(),
                active: None,
            }),
        }
    }

    /// Register `source` under `name` and make it active
    pub async fn connect(&self, name: impl Into<String>, source: S) -> Arc<S> {
        let name = name.into();
        let source = Arc::new(source);
        let mut inner = self.inner.write().await;
        inner.sources.insert(name.clone(), Arc::clone(&source));
        tracing::info!(connection = %name, "connected");
        inner.active = Some(name);
        source
    }

    /// Drop a connection. Tasks already holding it finish normally.
    pub async fn disconnect(&self, name: &str) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.sources.remove(name).is_some();
        if inner.active.as_deref() == Some(name) {
            inner.active = None;
        }
        if removed {
            tracing::info!(connection = %name, "disconnected");
        }
        removed
    }

    /// The source new work should run against
    pub async fn active(&self) -> DbResult<Arc<S>> {
        let inner = self.inner.read().await;
        inner
            .active
            .as_ref()
            .and_then(|name| inner.sources.get(name))
            .cloned()
            .ok_or(DbError::NotConnected)
    }
}

impl<S> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
