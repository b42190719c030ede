//! PostgreSQL data source
//!
//! Concrete implementation using tokio-postgres. A PostgreSQL session is bound
//! to one database, so the source keeps a small set of clients keyed by
//! database name and opens them on first use. Ad-hoc statements run on a
//! session of their own, so a server-side cancel never lands on a page load.

use crate::config::connections::SslMode;
use crate::config::{ConnectionConfig, Settings};
use crate::db::types::{ChildrenRequest, PageData, PageRequest, QueryOutput, SearchRequest};
use crate::db::{DataSource, escape_like, quote_ident};
use crate::error::{DbError, DbResult};
use crate::grid::cell::NULL_TEXT;
use crate::tree::{NodeDescriptor, NodeKind, NodeMeta};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{CancelToken, Client, Row};
use tokio_util::sync::CancellationToken;

struct Session {
    client: Client,
    cancel_token: CancelToken,
}

pub struct PostgresSource {
    config: ConnectionConfig,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    /// Locked for the whole statement, so one ad-hoc statement runs at a time
    query_session: Mutex<Option<Session>>,
    max_connections: usize,
    connect_timeout: Duration,
    show_system_schemas: bool,
    /// Receives a message when any background connection dies
    lost_tx: mpsc::UnboundedSender<String>,
}

impl PostgresSource {
    /// Connect to the configured database.
    ///
    /// Returns the source and a receiver that fires if a background
    /// connection is lost (e.g. server restart, idle timeout).
    pub async fn connect(
        config: &ConnectionConfig,
        settings: &Settings,
    ) -> DbResult<(Self, mpsc::UnboundedReceiver<String>)> {
        let (lost_tx, lost_rx) = mpsc::unbounded_channel();
        let connect_timeout = Duration::from_secs(settings.db.connect_timeout_secs.max(1));
        let session = open_session(config, connect_timeout, lost_tx.clone()).await?;
        tracing::info!(host = %config.host, database = %config.database, "postgres session opened");

        let mut sessions = HashMap::new();
        sessions.insert(config.database.clone(), Arc::new(session));
        Ok((
            Self {
                config: config.clone(),
                sessions: Mutex::new(sessions),
                query_session: Mutex::new(None),
                max_connections: settings.db.max_connections.max(1),
                connect_timeout,
                show_system_schemas: settings.tree.show_system_schemas,
                lost_tx,
            },
            lost_rx,
        ))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn session(&self, database: &str) -> DbResult<Arc<Session>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(database) {
            if !session.client.is_closed() {
                return Ok(Arc::clone(session));
            }
            sessions.remove(database);
        }
        if sessions.len() >= self.max_connections {
            return Err(DbError::PoolExhausted);
        }
        let config = self.config.with_database(database);
        let session =
            Arc::new(open_session(&config, self.connect_timeout, self.lost_tx.clone()).await?);
        tracing::debug!(database, "opened additional postgres session");
        sessions.insert(database.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Send a server-side cancel for whatever `session` is running.
    /// Only the query session is ever cancelled.
    async fn cancel_query(&self, session: &Session) -> DbResult<()> {
        match self.config.ssl_mode {
            SslMode::Disable => session.cancel_token.cancel_query(tokio_postgres::NoTls).await,
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                session.cancel_token.cancel_query(tls).await
            }
        }
        .map_err(|e| DbError::QueryFailed(format!("Cancel failed: {}", e)))
    }

    async fn catalog(
        &self,
        database: &str,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> DbResult<Vec<Row>> {
        let session = self.session(database).await?;
        session
            .client
            .query(sql, params)
            .await
            .map_err(|e| DbError::SchemaLoadFailed(e.to_string()))
    }

    async fn schema_children(&self, database: &str, schema: &str) -> DbResult<Vec<NodeDescriptor>> {
        let rows = self
            .catalog(database, SCHEMA_OBJECTS_SQL, &[&schema])
            .await?;
        Ok(rows.iter().filter_map(schema_object).collect())
    }

    async fn relation_children(
        &self,
        database: &str,
        schema: &str,
        relation: &str,
        kind: NodeKind,
    ) -> DbResult<Vec<NodeDescriptor>> {
        let mut children: Vec<NodeDescriptor> = self
            .catalog(database, COLUMNS_SQL, &[&schema, &relation])
            .await?
            .iter()
            .map(|row| {
                NodeDescriptor::new(NodeKind::Column, row.get::<_, String>(0)).with_meta(
                    NodeMeta::Column {
                        data_type: row.get(1),
                        nullable: row.get(2),
                        primary_key: row.get(3),
                    },
                )
            })
            .collect();

        if kind == NodeKind::CompositeType {
            return Ok(children);
        }

        let indexes = self
            .catalog(database, INDEXES_SQL, &[&schema, &relation])
            .await?;
        children.extend(indexes.iter().map(|row| {
            NodeDescriptor::new(NodeKind::Index, row.get::<_, String>(0)).with_meta(
                NodeMeta::Index {
                    unique: row.get(1),
                    primary: row.get(2),
                },
            )
        }));

        let triggers = self
            .catalog(database, TRIGGERS_SQL, &[&schema, &relation])
            .await?;
        children.extend(triggers.iter().map(|row| {
            NodeDescriptor::new(NodeKind::Trigger, row.get::<_, String>(0)).with_meta(
                NodeMeta::Trigger {
                    function: row.get(1),
                },
            )
        }));
        Ok(children)
    }
}

impl DataSource for PostgresSource {
    async fn load_databases(&self) -> DbResult<Vec<NodeDescriptor>> {
        let rows = self
            .catalog(
                &self.config.database,
                "SELECT datname, datname = current_database() \
                 FROM pg_database \
                 WHERE NOT datistemplate AND datallowconn \
                 ORDER BY datname",
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| {
                NodeDescriptor::new(NodeKind::Database, row.get::<_, String>(0))
                    .with_meta(NodeMeta::Database { active: row.get(1) })
            })
            .collect())
    }

    async fn load_schemas(&self, database: &str) -> DbResult<Vec<String>> {
        let rows = self
            .catalog(
                database,
                "SELECT nspname FROM pg_namespace \
                 WHERE $1 OR (nspname NOT LIKE 'pg_%' AND nspname != 'information_schema') \
                 ORDER BY nspname",
                &[&self.show_system_schemas],
            )
            .await?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    async fn load_children(&self, request: &ChildrenRequest) -> DbResult<Vec<NodeDescriptor>> {
        let db = request.database.as_str();
        match (request.kind, &request.schema, &request.relation) {
            (NodeKind::Database, _, _) => Ok(self
                .load_schemas(db)
                .await?
                .into_iter()
                .map(|name| NodeDescriptor::new(NodeKind::Schema, name))
                .collect()),
            (NodeKind::Schema, Some(schema), _) => self.schema_children(db, schema).await,
            (
                kind @ (NodeKind::Table
                | NodeKind::View
                | NodeKind::MaterializedView
                | NodeKind::CompositeType),
                Some(schema),
                Some(relation),
            ) => self.relation_children(db, schema, relation, kind).await,
            _ => Ok(Vec::new()),
        }
    }

    async fn load_page(&self, request: &PageRequest) -> DbResult<PageData> {
        let session = self.session(&request.database).await?;
        let relation = format!(
            "{}.{}",
            quote_ident(&request.schema),
            quote_ident(&request.table)
        );
        let order_by = request
            .sort
            .as_ref()
            .map(|s| {
                format!(
                    " ORDER BY {} {} NULLS {}",
                    quote_ident(&s.column),
                    s.direction.as_sql(),
                    if s.nulls_first { "FIRST" } else { "LAST" }
                )
            })
            .unwrap_or_default();
        let page_sql = format!(
            "SELECT * FROM {}{} LIMIT {} OFFSET {}",
            relation, order_by, request.limit, request.offset
        );
        tracing::debug!(sql = %page_sql, counted = request.known_total.is_none(), "loading page");

        let client = &session.client;
        let (stmt, total) = match request.known_total {
            Some(total) => {
                let stmt = client
                    .prepare(&page_sql)
                    .await
                    .map_err(|e| DbError::QueryFailed(e.to_string()))?;
                (stmt, total)
            }
            None => {
                let count_sql = format!("SELECT count(*) FROM {}", relation);
                let (stmt, count_row) =
                    tokio::try_join!(client.prepare(&page_sql), client.query_one(&count_sql, &[]))
                        .map_err(|e| DbError::QueryFailed(e.to_string()))?;
                let count: i64 = count_row.get(0);
                (stmt, count.max(0) as usize)
            }
        };
        let rows = client
            .query(&stmt, &[])
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        Ok(PageData {
            columns: stmt.columns().iter().map(|c| c.name().to_string()).collect(),
            rows: rows.iter().map(row_texts).collect(),
            total_rows: total,
        })
    }

    async fn execute_query(&self, sql: &str, cancel: CancellationToken) -> DbResult<QueryOutput> {
        let mut slot = tokio::select! {
            _ = cancel.cancelled() => return Err(DbError::Cancelled),
            slot = self.query_session.lock() => slot,
        };
        let session = match slot.take() {
            Some(session) if !session.client.is_closed() => session,
            _ => {
                tracing::debug!(database = %self.config.database, "opening query session");
                open_session(&self.config, self.connect_timeout, self.lost_tx.clone()).await?
            }
        };
        let session: &Session = slot.insert(session);
        let start = Instant::now();

        let run = run_statement(&session.client, sql);

        let (columns, rows, rows_affected) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if let Err(e) = self.cancel_query(session).await {
                    tracing::warn!(error = %e, "server-side cancel failed");
                }
                return Err(DbError::Cancelled);
            }
            result = run => result?,
        };

        Ok(QueryOutput {
            columns,
            rows,
            rows_affected,
            duration: start.elapsed(),
        })
    }

    async fn search_table(&self, request: &SearchRequest) -> DbResult<PageData> {
        let session = self.session(&request.database).await?;
        let sql = format!(
            "SELECT * FROM {}.{} AS t WHERE t::text ILIKE $1 LIMIT {}",
            quote_ident(&request.schema),
            quote_ident(&request.table),
            request.limit
        );
        let pattern = format!("%{}%", escape_like(&request.query));
        let client = &session.client;
        let stmt = client
            .prepare(&sql)
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        let rows = client
            .query(&stmt, &[&pattern])
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        Ok(PageData {
            columns: stmt.columns().iter().map(|c| c.name().to_string()).collect(),
            total_rows: rows.len(),
            rows: rows.iter().map(row_texts).collect(),
        })
    }
}

/// Statements without result columns report the affected row count instead
async fn run_statement(
    client: &Client,
    sql: &str,
) -> DbResult<(Vec<String>, Vec<Vec<String>>, u64)> {
    let stmt = client
        .prepare(sql)
        .await
        .map_err(|e| DbError::QueryFailed(e.to_string()))?;
    let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
    if columns.is_empty() {
        let affected = client
            .execute(&stmt, &[])
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        return Ok((columns, Vec::new(), affected));
    }
    let rows = client
        .query(&stmt, &[])
        .await
        .map_err(|e| DbError::QueryFailed(e.to_string()))?;
    let affected = rows.len() as u64;
    Ok((columns, rows.iter().map(row_texts).collect(), affected))
}

async fn open_session(
    config: &ConnectionConfig,
    timeout: Duration,
    lost_tx: mpsc::UnboundedSender<String>,
) -> DbResult<Session> {
    tokio::time::timeout(timeout, connect_session(config, lost_tx))
        .await
        .map_err(|_| DbError::Timeout)?
}

async fn connect_session(
    config: &ConnectionConfig,
    lost_tx: mpsc::UnboundedSender<String>,
) -> DbResult<Session> {
    let conn_string = config.connection_string_with_password();
    let database = config.database.clone();

    let client = match config.ssl_mode {
        SslMode::Disable => {
            let (client, connection) = tokio_postgres::connect(&conn_string, tokio_postgres::NoTls)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    let _ = lost_tx.send(format!("Connection to {} lost: {}", database, e));
                }
            });
            client
        }
        SslMode::Prefer | SslMode::Require => {
            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
            let (client, connection) = tokio_postgres::connect(&conn_string, tls)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    let _ = lost_tx.send(format!("Connection to {} lost: {}", database, e));
                }
            });
            client
        }
    };

    let cancel_token = client.cancel_token();
    Ok(Session {
        client,
        cancel_token,
    })
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let loaded = native_certs
        .certs
        .into_iter()
        .filter(|cert| root_store.add(cert.clone()).is_ok())
        .count();
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

// ── Catalog queries ─────────────────────────────────────────────

/// Every object kind under a schema, tagged and ordered for display
const SCHEMA_OBJECTS_SQL: &str = "\
    SELECT kind, name, detail, extra, estimate FROM ( \
      SELECT CASE c.relkind WHEN 'r' THEN 'table' WHEN 'p' THEN 'table' \
                            WHEN 'v' THEN 'view' ELSE 'matview' END AS kind, \
             c.relname::text AS name, NULL::text AS detail, NULL::text AS extra, \
             c.reltuples::bigint AS estimate, \
             CASE c.relkind WHEN 'v' THEN 2 WHEN 'm' THEN 3 ELSE 1 END AS ord \
      FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
      WHERE n.nspname = $1 AND c.relkind IN ('r', 'p', 'v', 'm') AND NOT c.relispartition \
      UNION ALL \
      SELECT CASE WHEN p.prokind = 'p' THEN 'procedure' \
                  WHEN p.prorettype = 'pg_catalog.trigger'::regtype THEN 'trigger_fn' \
                  ELSE 'function' END, \
             p.proname::text, pg_get_function_identity_arguments(p.oid), \
             pg_get_function_result(p.oid), NULL, \
             CASE WHEN p.prokind = 'p' THEN 5 \
                  WHEN p.prorettype = 'pg_catalog.trigger'::regtype THEN 6 ELSE 4 END \
      FROM pg_proc p JOIN pg_namespace n ON n.oid = p.pronamespace \
      WHERE n.nspname = $1 AND p.prokind IN ('f', 'p') \
      UNION ALL \
      SELECT 'sequence', c.relname::text, NULL, NULL, NULL, 7 \
      FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
      WHERE n.nspname = $1 AND c.relkind = 'S' \
      UNION ALL \
      SELECT CASE t.typtype WHEN 'c' THEN 'composite' WHEN 'e' THEN 'enum' \
                            WHEN 'd' THEN 'domain' ELSE 'range' END, \
             t.typname::text, \
             CASE WHEN t.typtype = 'd' THEN format_type(t.typbasetype, t.typtypmod) END, \
             CASE WHEN t.typtype = 'e' THEN \
               (SELECT string_agg(e.enumlabel, ',' ORDER BY e.enumsortorder) \
                FROM pg_enum e WHERE e.enumtypid = t.oid) END, \
             NULL, 8 \
      FROM pg_type t JOIN pg_namespace n ON n.oid = t.typnamespace \
      LEFT JOIN pg_class c ON c.oid = t.typrelid \
      WHERE n.nspname = $1 AND t.typtype IN ('c', 'e', 'd', 'r') \
        AND (t.typtype <> 'c' OR c.relkind = 'c') \
      UNION ALL \
      SELECT 'extension', x.extname::text, x.extversion, NULL, NULL, 9 \
      FROM pg_extension x JOIN pg_namespace n ON n.oid = x.extnamespace \
      WHERE n.nspname = $1 \
    ) objects ORDER BY ord, name";

const COLUMNS_SQL: &str = "\
    SELECT a.attname::text, format_type(a.atttypid, a.atttypmod), NOT a.attnotnull, \
           EXISTS (SELECT 1 FROM pg_constraint con \
                   WHERE con.conrelid = c.oid AND con.contype = 'p' \
                     AND a.attnum = ANY(con.conkey)) \
    FROM pg_class c \
    JOIN pg_namespace n ON n.oid = c.relnamespace \
    JOIN pg_attribute a ON a.attrelid = c.oid \
    WHERE n.nspname = $1 AND c.relname = $2 AND a.attnum > 0 AND NOT a.attisdropped \
    ORDER BY a.attnum";

const INDEXES_SQL: &str = "\
    SELECT ci.relname::text, ix.indisunique, ix.indisprimary \
    FROM pg_index ix \
    JOIN pg_class ci ON ci.oid = ix.indexrelid \
    JOIN pg_class ct ON ct.oid = ix.indrelid \
    JOIN pg_namespace n ON n.oid = ct.relnamespace \
    WHERE n.nspname = $1 AND ct.relname = $2 \
    ORDER BY ci.relname";

const TRIGGERS_SQL: &str = "\
    SELECT tg.tgname::text, p.proname::text \
    FROM pg_trigger tg \
    JOIN pg_class c ON c.oid = tg.tgrelid \
    JOIN pg_namespace n ON n.oid = c.relnamespace \
    JOIN pg_proc p ON p.oid = tg.tgfoid \
    WHERE n.nspname = $1 AND c.relname = $2 AND NOT tg.tgisinternal \
    ORDER BY tg.tgname";

fn schema_object(row: &Row) -> Option<NodeDescriptor> {
    let kind_tag: String = row.get(0);
    let name: String = row.get(1);
    let detail: Option<String> = row.get(2);
    let extra: Option<String> = row.get(3);
    let estimate: Option<i64> = row.get(4);

    let (kind, meta) = match kind_tag.as_str() {
        "table" => (NodeKind::Table, relation_meta(estimate)),
        "view" => (NodeKind::View, NodeMeta::Relation { row_estimate: None }),
        "matview" => (NodeKind::MaterializedView, relation_meta(estimate)),
        tag @ ("function" | "procedure" | "trigger_fn") => {
            let kind = match tag {
                "function" => NodeKind::Function,
                "procedure" => NodeKind::Procedure,
                _ => NodeKind::TriggerFunction,
            };
            (
                kind,
                NodeMeta::Routine {
                    arguments: detail.unwrap_or_default(),
                    returns: extra,
                },
            )
        }
        "sequence" => (NodeKind::Sequence, NodeMeta::None),
        "composite" => (NodeKind::CompositeType, NodeMeta::None),
        "enum" => (
            NodeKind::EnumType,
            NodeMeta::EnumType {
                labels: extra
                    .map(|l| l.split(',').map(str::to_string).collect())
                    .unwrap_or_default(),
            },
        ),
        "domain" => (NodeKind::DomainType, NodeMeta::None),
        "range" => (NodeKind::RangeType, NodeMeta::None),
        "extension" => (
            NodeKind::Extension,
            NodeMeta::Extension {
                version: detail.unwrap_or_default(),
            },
        ),
        _ => return None,
    };
    Some(NodeDescriptor::new(kind, name).with_meta(meta))
}

// reltuples is -1 for tables that were never analyzed
fn relation_meta(estimate: Option<i64>) -> NodeMeta {
    NodeMeta::Relation {
        row_estimate: estimate.filter(|n| *n >= 0),
    }
}

// ── Value rendering ─────────────────────────────────────────────

fn row_texts(row: &Row) -> Vec<String> {
    (0..row.len()).map(|i| cell_text(row, i)).collect()
}

/// Render one value as display text, `"NULL"` for SQL NULL
fn cell_text(row: &Row, idx: usize) -> String {
    let ty = row.columns()[idx].type_().clone();
    let text = match ty {
        Type::INT2 => scalar::<i16>(row, idx),
        Type::INT4 => scalar::<i32>(row, idx),
        Type::INT8 => scalar::<i64>(row, idx),
        Type::FLOAT4 => scalar::<f32>(row, idx),
        Type::FLOAT8 => scalar::<f64>(row, idx),
        Type::NUMERIC => scalar::<Decimal>(row, idx),
        Type::BOOL => scalar::<bool>(row, idx),
        Type::OID => scalar::<u32>(row, idx),
        Type::UUID => scalar::<uuid::Uuid>(row, idx),
        Type::JSON | Type::JSONB => scalar::<serde_json::Value>(row, idx),
        Type::TIMESTAMP => scalar::<chrono::NaiveDateTime>(row, idx),
        Type::TIMESTAMPTZ => scalar::<chrono::DateTime<chrono::Utc>>(row, idx),
        Type::DATE => scalar::<chrono::NaiveDate>(row, idx),
        Type::TIME => scalar::<chrono::NaiveTime>(row, idx),
        Type::BYTEA => match row.try_get::<_, Option<Vec<u8>>>(idx) {
            Ok(Some(v)) => Some(format!("<binary {} bytes>", v.len())),
            Ok(None) => Some(NULL_TEXT.to_string()),
            Err(_) => None,
        },
        Type::INT2_ARRAY => array::<i16>(row, idx),
        Type::INT4_ARRAY => array::<i32>(row, idx),
        Type::INT8_ARRAY => array::<i64>(row, idx),
        Type::FLOAT4_ARRAY => array::<f32>(row, idx),
        Type::FLOAT8_ARRAY => array::<f64>(row, idx),
        Type::NUMERIC_ARRAY => array::<Decimal>(row, idx),
        Type::BOOL_ARRAY => array::<bool>(row, idx),
        Type::UUID_ARRAY => array::<uuid::Uuid>(row, idx),
        Type::JSON_ARRAY | Type::JSONB_ARRAY => array::<serde_json::Value>(row, idx),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::NAME_ARRAY => array::<String>(row, idx),
        _ => None,
    };
    text.unwrap_or_else(|| try_as_string(row, idx))
}

/// `None` when `T` does not match the column type
fn scalar<T>(row: &Row, idx: usize) -> Option<String>
where
    T: for<'a> FromSql<'a> + Display,
{
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => Some(v.to_string()),
        Ok(None) => Some(NULL_TEXT.to_string()),
        Err(_) => None,
    }
}

fn array<T>(row: &Row, idx: usize) -> Option<String>
where
    T: for<'a> FromSql<'a> + Display,
{
    match row.try_get::<_, Option<Vec<Option<T>>>>(idx) {
        Ok(Some(items)) => {
            let parts: Vec<String> = items
                .iter()
                .map(|v| match v {
                    Some(v) => v.to_string(),
                    None => NULL_TEXT.to_string(),
                })
                .collect();
            Some(format!("{{{}}}", parts.join(",")))
        }
        Ok(None) => Some(NULL_TEXT.to_string()),
        Err(_) => None,
    }
}

/// Text fallback for types without a typed mapping.
///
/// When even that fails, shows the postgres type name so the user knows
/// what could not be displayed.
fn try_as_string(row: &Row, idx: usize) -> String {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => v,
        Ok(None) => NULL_TEXT.to_string(),
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            format!("<unable to display: {}>", type_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_meta_hides_unanalyzed_estimate() {
        assert_eq!(
            relation_meta(Some(-1)),
            NodeMeta::Relation { row_estimate: None }
        );
        assert_eq!(
            relation_meta(Some(42)),
            NodeMeta::Relation {
                row_estimate: Some(42)
            }
        );
    }

    #[test]
    fn test_tls_config_builds() {
        let config = make_tls_config();
        assert!(config.alpn_protocols.is_empty());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts the TCP handshake but never answers the startup message
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ConnectionConfig {
            name: "silent".to_string(),
            host: "127.0.0.1".to_string(),
            port: listener.local_addr().unwrap().port(),
            database: "app".to_string(),
            username: "nobody".to_string(),
            password: None,
            ssl_mode: SslMode::Disable,
        };
        let (lost_tx, _lost_rx) = mpsc::unbounded_channel();
        let result = open_session(&config, Duration::from_millis(100), lost_tx).await;
        assert!(matches!(result, Err(DbError::Timeout)));
    }
}
