//! End-to-end event flow: app state machine, dispatcher and background tasks
//! running against an in-memory data source.

mod common;

use common::{FakeSource, Harness, SLOW_QUERY};
use crossterm::event::KeyCode;
use dbnav::app::{PanelFocus, StatusLevel};
use dbnav::dispatch::AppEvent;
use dbnav::grid::GridTarget;
use std::time::Duration;

#[tokio::test]
async fn test_startup_loads_active_database() {
    let h = Harness::start(FakeSource::new(100)).await;
    let app_db = h.app.tree.find_by_id("db:app").unwrap();
    let node = h.app.tree.node(app_db).unwrap();
    assert!(node.is_expanded());
    assert!(node.is_loaded());
    assert!(h.app.tree.find_by_id("db:app/schema:public").is_some());
    assert!(h.app.loading_node().is_none());
    assert_eq!(h.app.breadcrumb().as_deref(), Some("app"));
}

#[tokio::test]
async fn test_open_table_fills_grid_and_cache() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    let tab = h.app.tab();
    assert_eq!(h.app.focus, PanelFocus::Grid);
    assert_eq!(tab.grid.row_count(), 10);
    assert_eq!(tab.grid.total_rows(), 100);
    assert!(!tab.grid.is_paging());
    assert_eq!(tab.cache.len(), 10);
    assert_eq!(tab.cache.get(9), Some(vec!["9".to_string(), "user9".to_string()]));
}

#[tokio::test]
async fn test_scrolling_prefetches_next_page() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    for _ in 0..7 {
        h.key('j');
    }
    h.settle().await;

    assert_eq!(h.app.tab().grid.row_count(), 20);
    assert_eq!(h.app.tab().grid.selected_row(), 7);
    assert_eq!(h.source.page_calls(), 2);
}

#[tokio::test]
async fn test_prefetch_does_not_recount() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    for _ in 0..8 {
        h.key('j');
        h.settle().await;
    }

    assert!(h.app.tab().grid.row_count() >= 20);
    assert_eq!(h.app.tab().grid.total_rows(), 100);
    assert!(h.source.page_calls() >= 2);
    assert_eq!(h.source.count_calls(), 1);
    let requests = h.source.page_requests.lock();
    assert!(requests[1..].iter().all(|r| r.known_total == Some(100)));
}

#[tokio::test]
async fn test_counted_jump_past_loaded_window() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    h.type_text("50G");
    h.settle().await;

    let grid = &h.app.tab().grid;
    assert_eq!(grid.selected_row(), 49);
    assert!(grid.row_count() >= 50);
    assert!(grid.pending_jump().is_none());
}

#[tokio::test]
async fn test_leaving_table_search_reuses_cache() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    h.key('?');
    h.type_text("user5");
    h.press(KeyCode::Enter);
    h.settle().await;
    assert!(matches!(
        h.app.tab().grid.target(),
        GridTarget::Search { query, .. } if query == "user5"
    ));
    assert_eq!(h.app.tab().grid.row_count(), 11);

    let calls = h.source.page_calls();
    h.press(KeyCode::Esc);
    h.settle().await;
    assert_eq!(h.source.page_calls(), calls);
    assert!(matches!(h.app.tab().grid.target(), GridTarget::Table { .. }));
    assert_eq!(h.app.tab().grid.row_count(), 10);
}

#[tokio::test]
async fn test_sort_reloads_with_ordering() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    h.key('s');
    h.key('s');
    h.settle().await;

    let last = h.source.page_requests.lock().last().cloned().unwrap();
    assert_eq!(last.offset, 0);
    assert!(last.sort.is_some());
    assert_eq!(h.app.tab().grid.rows()[0][0], "99");
}

#[tokio::test]
async fn test_resort_releases_pins() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    h.key('p');
    assert_eq!(h.app.tab().grid.pins().len(), 1);

    h.key('s');
    h.key('s');
    h.settle().await;
    assert!(h.app.tab().grid.pins().is_empty());

    h.key('p');
    let pins = h.app.tab().grid.pins();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins.rows()[0].values[0], "99");
}

#[tokio::test]
async fn test_query_result_beats_slow_page() {
    let mut source = FakeSource::new(100);
    source.page_delay = Duration::from_millis(100);
    let mut h = Harness::start(source).await;
    h.open_users().await;

    let action = h.app.execute_sql("select 1 as one");
    h.dispatcher.dispatch(action);
    h.settle().await;

    let tab = h.app.tab();
    assert_eq!(tab.grid.columns(), ["one".to_string()]);
    assert!(matches!(tab.grid.target(), GridTarget::Query { .. }));
    assert!(!tab.grid.is_paging());
}

#[tokio::test]
async fn test_cancel_running_query() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    let action = h.app.execute_sql(SLOW_QUERY);
    h.dispatcher.dispatch(action);
    assert!(h.dispatcher.query_in_flight());

    h.ctrl('c');
    h.settle().await;

    assert!(!h.dispatcher.query_in_flight());
    assert!(!h.app.tab().query_running);
    assert!(h.app.tab().grid.columns().is_empty());
    let status = h.app.status_message.as_ref().unwrap();
    assert_eq!(status.level, StatusLevel::Warning);
}

#[tokio::test]
async fn test_new_query_supersedes_running_one() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    let action = h.app.execute_sql(SLOW_QUERY);
    h.dispatcher.dispatch(action);
    let action = h.app.execute_sql("select 1");
    h.dispatcher.dispatch(action);
    h.settle().await;

    assert_eq!(h.app.tab().grid.columns(), ["one".to_string()]);
    assert!(!h.app.tab().query_running);
}

#[tokio::test]
async fn test_query_error_reported() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.key(':');
    h.type_text("selec oops");
    h.press(KeyCode::Enter);
    h.settle().await;

    let status = h.app.status_message.as_ref().unwrap();
    assert_eq!(status.level, StatusLevel::Error);
    assert!(status.message.contains("syntax error"));
}

#[tokio::test]
async fn test_failed_schema_load_collapses_node() {
    let mut source = FakeSource::new(100);
    source.fail_schema = Some("public".to_string());
    let mut h = Harness::start(source).await;

    h.send(AppEvent::TreeNodeExpanded {
        node_id: "db:app/schema:public".to_string(),
        expanded: true,
    });
    h.settle().await;

    let public = h.app.tree.find_by_id("db:app/schema:public").unwrap();
    let node = h.app.tree.node(public).unwrap();
    assert!(!node.is_expanded());
    assert!(!node.is_loaded());
    assert!(h.app.loading_node().is_none());
    assert_eq!(
        h.app.status_message.as_ref().map(|s| s.level),
        Some(StatusLevel::Error)
    );

    // A later attempt is allowed again
    h.send(AppEvent::TreeNodeExpanded {
        node_id: "db:app/schema:public".to_string(),
        expanded: true,
    });
    assert_eq!(h.app.loading_node(), Some("db:app/schema:public"));
}

#[tokio::test]
async fn test_tabs_keep_independent_grids() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.open_users().await;
    h.settle().await;

    h.ctrl('t');
    assert_eq!(h.app.tab_count(), 2);
    assert_eq!(h.app.tab().grid.row_count(), 0);

    h.key(':');
    h.type_text("select 1");
    h.press(KeyCode::Enter);
    h.settle().await;
    assert_eq!(h.app.tab().grid.columns(), ["one".to_string()]);

    h.ctrl('w');
    assert_eq!(h.app.tab_count(), 1);
    assert_eq!(h.app.tab().grid.row_count(), 10);
}

#[tokio::test]
async fn test_reconnect_drops_old_tree_results() {
    let mut h = Harness::start(FakeSource::new(100)).await;
    h.send(AppEvent::TreeNodeExpanded {
        node_id: "db:app/schema:public".to_string(),
        expanded: true,
    });
    // Rebuild before the children arrive
    let action = h.app.reload_tree();
    h.dispatcher.dispatch(action);
    h.settle().await;

    assert!(h.app.tree.find_by_id("db:app/schema:public/table:users").is_none());
    assert!(h.app.tree.find_by_id("db:app/schema:public").is_some());
}
