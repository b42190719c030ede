//! Application state and event handling
//!
//! Central state machine: events come in, state updates, actions go out.
//!
//! Everything here runs on the UI loop and is mutated only while handling an
//! [`AppEvent`]. Background completions are matched back to their target by
//! identity (tree generation and node id, tab id and load generation, query
//! id) and dropped when that target is gone or has moved on.

use crate::cache::RowCache;
use crate::config::Settings;
use crate::db::types::{ChildrenRequest, PageData, PageRequest, QueryOutput, SearchRequest};
use crate::dispatch::{Action, AppEvent};
use crate::error::{DbError, DbResult, ErrorKind, Result};
use crate::fuzzy::FuzzyMatcher;
use crate::grid::{
    GridState, GridTarget, Motion, MotionInput, MotionOutcome, MotionState, PageApply, PinChange,
};
use crate::keymap::{KeyAction, KeyMap};
use crate::tree::{NodeDescriptor, NodeIndex, NodeKind, ToggleOutcome, TreeModel};
use crate::ui::layout;
use crate::ui::prompt::{Prompt, PromptMode};
use crate::ui::theme::Theme;
use crate::ui::tree::TreeBrowser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single grid tab with its own viewport state and row cache
pub struct Tab {
    /// Stable identifier (monotonically increasing, never reused)
    pub id: usize,
    pub grid: GridState,
    /// Rows fetched for the current table, keyed by offset
    pub cache: Arc<RowCache>,
    /// Whether this tab has a query in flight
    pub query_running: bool,
    pending_query: Option<u64>,
    /// Bumped whenever outstanding page, prefetch or search results stop applying
    load_generation: u64,
    /// Columns and row total of the table behind `cache`
    table_shape: Option<(Vec<String>, usize)>,
    /// Failed first-page load, shown in place of the grid
    pub error: Option<String>,
}

impl Tab {
    fn new(id: usize, settings: &Settings) -> Self {
        let motion = MotionState::new(Duration::from_millis(settings.ui.motion_timeout_ms));
        Self {
            id,
            grid: GridState::new(
                GridTarget::Query { sql: String::new() },
                &settings.grid,
                motion,
            ),
            cache: Arc::new(RowCache::new(settings.grid.row_cache_capacity)),
            query_running: false,
            pending_query: None,
            load_generation: 0,
            table_shape: None,
            error: None,
        }
    }

    pub fn title(&self) -> String {
        let title = self.grid.target().title();
        if title.is_empty() {
            "new".to_string()
        } else {
            title
        }
    }

    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }

    fn invalidate_loads(&mut self) {
        self.load_generation += 1;
        self.grid.set_paging(false);
        self.grid.set_prefetching(false);
        self.grid.clear_pending_jump();
    }

    /// Start over with an empty cache. Fetches still in flight keep writing
    /// into the old one, which nothing reads any more.
    fn reset_table_cache(&mut self) {
        self.cache = Arc::new(RowCache::new(self.cache.capacity()));
        self.table_shape = None;
    }

    /// A page answered entirely from the row cache, if it holds every row
    fn cached_page(&self, request: &PageRequest) -> Option<PageData> {
        let (columns, total) = self.table_shape.as_ref()?;
        let limit = request.limit.min(total.saturating_sub(request.offset));
        let rows = self.cache.get_range(request.offset, limit)?;
        Some(PageData {
            columns: columns.clone(),
            rows,
            total_rows: *total,
        })
    }
}

/// Main application state
pub struct App {
    /// Name of current connection profile
    pub connection_name: Option<String>,

    /// Which panel currently has focus
    pub focus: PanelFocus,

    /// Focus before the prompt was opened (to restore on Escape)
    pub previous_focus: PanelFocus,

    pub tree: TreeModel,
    pub tree_browser: TreeBrowser,
    /// Bumped when the tree is rebuilt; older completions are ignored
    tree_generation: u64,
    /// Identity of the node whose children are loading. One at a time per tree.
    loading_node: Option<String>,

    pub prompt: Prompt,

    /// Grid tabs
    pub tabs: Vec<Tab>,
    /// Index into `tabs` for the currently active tab
    pub active_tab: usize,
    /// Next stable tab ID to assign
    next_tab_id: usize,
    next_query_id: u64,

    settings: Settings,
    matcher: FuzzyMatcher,

    /// Data-driven keybinding configuration
    pub keymap: KeyMap,

    /// UI theme (created once, reused every frame)
    pub theme: Theme,

    /// Status message to display
    pub status_message: Option<StatusMessage>,

    /// Terminal size, used to size grid viewports
    screen: Rect,

    /// Whether the application is running
    pub running: bool,
}

/// Panel focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelFocus {
    Tree,
    Grid,
    Prompt,
}

/// Status message with severity level
pub struct StatusMessage {
    pub message: String,
    pub level: StatusLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            connection_name: None,
            focus: PanelFocus::Tree,
            previous_focus: PanelFocus::Tree,
            tree: TreeModel::new(""),
            tree_browser: TreeBrowser::new(),
            tree_generation: 0,
            loading_node: None,
            prompt: Prompt::new(),
            tabs: vec![Tab::new(0, settings)],
            active_tab: 0,
            next_tab_id: 1,
            next_query_id: 1,
            settings: settings.clone(),
            matcher: FuzzyMatcher::new(),
            keymap: KeyMap::default(),
            theme: Theme::default(),
            status_message: None,
            screen: Rect::default(),
            running: true,
        }
    }

    /// Start browsing a connection: rebuild the tree and ask for its databases
    pub fn set_connection(&mut self, name: &str) -> Action {
        self.connection_name = Some(name.to_string());
        self.reload_tree()
    }

    /// Handle an application event and return resulting action
    pub fn handle_event(&mut self, event: AppEvent) -> Result<Action> {
        let action = match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(width, height) => {
                self.screen = Rect::new(0, 0, width, height);
                Action::None
            }
            AppEvent::Tick => {
                let now = Instant::now();
                for tab in &mut self.tabs {
                    tab.grid.motion_mut().expire(now);
                }
                Action::None
            }
            AppEvent::DatabasesLoaded { generation, result } => {
                self.on_databases_loaded(generation, result)
            }
            AppEvent::NodeChildrenLoaded {
                generation,
                node_id,
                result,
            } => self.on_children_loaded(generation, &node_id, result),
            AppEvent::TableDataLoaded {
                tab_id,
                generation,
                offset,
                result,
            } => self.on_page_loaded(tab_id, generation, offset, result, false),
            AppEvent::PrefetchComplete {
                tab_id,
                generation,
                offset,
                result,
            } => self.on_page_loaded(tab_id, generation, offset, result, true),
            AppEvent::QueryResult {
                tab_id,
                query_id,
                sql,
                result,
            } => self.on_query_result(tab_id, query_id, sql, result),
            AppEvent::SearchResult {
                tab_id,
                generation,
                query,
                result,
            } => self.on_search_result(tab_id, generation, query, result),
            AppEvent::TreeNodeExpanded { node_id, expanded } => {
                self.on_node_expanded(&node_id, expanded)
            }
            AppEvent::TreeNodeSelected { node_id } => self.on_node_selected(&node_id),
            AppEvent::ConnectionLost(msg) => {
                tracing::warn!(reason = %msg, "connection lost");
                self.set_status(msg, StatusLevel::Error);
                Action::None
            }
        };
        self.sync_viewports();
        Ok(action)
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Reference to the active tab
    pub fn tab(&self) -> &Tab {
        &self.tabs[self.active_tab]
    }

    /// Mutable reference to the active tab
    pub fn tab_mut(&mut self) -> &mut Tab {
        &mut self.tabs[self.active_tab]
    }

    /// Number of open tabs
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Find the index of a tab by its stable ID
    fn tab_index_by_id(&self, id: usize) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn loading_node(&self) -> Option<&str> {
        self.loading_node.as_deref()
    }

    pub fn tree_generation(&self) -> u64 {
        self.tree_generation
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Path of the selected tree node, e.g. `app › public › users`
    pub fn breadcrumb(&self) -> Option<String> {
        let index = self.tree_browser.selected_node()?;
        Some(self.tree.path_labels(index).join(" › "))
    }

    pub fn set_status(&mut self, message: String, level: StatusLevel) {
        self.status_message = Some(StatusMessage { message, level });
    }

    /// Surface a foreground failure by kind. Cancellations stay silent and
    /// connectivity failures are never retried.
    fn report_failure(&mut self, what: &str, error: &DbError) {
        match error.kind() {
            ErrorKind::Cancelled => tracing::debug!(what, "cancelled"),
            ErrorKind::Connectivity => {
                tracing::warn!(what, error = %error, "connection unavailable");
                self.set_status(
                    format!("{} failed, connection unavailable: {}", what, error),
                    StatusLevel::Error,
                );
            }
            ErrorKind::Remote => {
                tracing::debug!(what, error = %error, "rejected by server");
                self.set_status(format!("{} failed: {}", what, error), StatusLevel::Error);
            }
        }
    }

    // ── Keys ────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        self.status_message = None;

        if self.focus == PanelFocus::Grid
            && let Some(action) = self.try_motion(key)
        {
            return action;
        }

        // Global bindings first, then the focused panel
        if let Some(key_action) = self.keymap.resolve(self.focus, key) {
            match key_action {
                KeyAction::CycleFocus
                | KeyAction::CycleFocusReverse
                | KeyAction::NewTab
                | KeyAction::CloseTab
                    if self.focus == PanelFocus::Prompt =>
                {
                    return Action::None;
                }
                _ => return self.execute_key_action(key_action),
            }
        }

        if self.focus == PanelFocus::Prompt {
            self.edit_prompt(key);
        }
        Action::None
    }

    /// Feed plain characters to the grid's motion state machine
    fn try_motion(&mut self, key: KeyEvent) -> Option<Action> {
        let KeyCode::Char(c) = key.code else {
            return None;
        };
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match self.tab_mut().grid.motion_mut().handle_key(c, Instant::now()) {
            MotionInput::Pending => Some(Action::None),
            MotionInput::Motion(motion) => Some(self.apply_motion(motion)),
            MotionInput::Unhandled => None,
        }
    }

    fn execute_key_action(&mut self, action: KeyAction) -> Action {
        match action {
            KeyAction::Quit => {
                self.running = false;
                Action::Quit
            }
            KeyAction::CycleFocus | KeyAction::CycleFocusReverse => {
                self.focus = match self.focus {
                    PanelFocus::Tree => PanelFocus::Grid,
                    PanelFocus::Grid => PanelFocus::Tree,
                    PanelFocus::Prompt => PanelFocus::Prompt,
                };
                Action::None
            }
            KeyAction::NewTab => {
                if !self.new_tab() {
                    self.set_status(
                        format!("Tab limit reached ({})", self.settings.ui.max_tabs),
                        StatusLevel::Warning,
                    );
                }
                Action::None
            }
            KeyAction::CloseTab => self.close_tab(),
            KeyAction::NextTab => {
                self.next_tab();
                Action::None
            }
            KeyAction::CancelQuery => self.cancel_query(),
            KeyAction::OpenSqlPrompt => {
                self.open_prompt(PromptMode::Sql);
                Action::None
            }
            KeyAction::FilterTree => {
                self.open_prompt(PromptMode::TreeFilter);
                Action::None
            }
            KeyAction::LocalSearch => {
                self.open_prompt(PromptMode::LocalSearch);
                Action::None
            }
            KeyAction::TableSearch => {
                self.open_prompt(PromptMode::TableSearch);
                Action::None
            }
            KeyAction::Submit => self.submit_prompt(),
            KeyAction::Dismiss => self.dismiss(),
            _ => match self.focus {
                PanelFocus::Tree => self.tree_action(action),
                PanelFocus::Grid => self.grid_action(action),
                PanelFocus::Prompt => Action::None,
            },
        }
    }

    // ── Prompt ──────────────────────────────────────────────────

    fn open_prompt(&mut self, mode: PromptMode) {
        self.previous_focus = self.focus;
        self.focus = PanelFocus::Prompt;
        if mode == PromptMode::TreeFilter {
            let current = self.tree_browser.filter().to_string();
            self.prompt.activate_with(mode, &current);
        } else {
            self.prompt.activate(mode);
        }
    }

    fn edit_prompt(&mut self, key: KeyEvent) {
        if self.prompt.handle_key(key) && self.prompt.mode() == Some(PromptMode::TreeFilter) {
            let filter = self.prompt.input().to_string();
            self.tree_browser.set_filter(&filter);
            self.refresh_tree();
        }
    }

    fn submit_prompt(&mut self) -> Action {
        let Some(mode) = self.prompt.mode() else {
            return Action::None;
        };
        let input = self.prompt.input().to_string();
        self.prompt.deactivate();
        self.focus = self.previous_focus;
        match mode {
            PromptMode::Sql => {
                self.focus = PanelFocus::Grid;
                self.execute_sql(&input)
            }
            PromptMode::LocalSearch => {
                self.search_loaded(&input);
                Action::None
            }
            PromptMode::TableSearch => self.search_table(&input),
            // The filter is applied while typing
            PromptMode::TreeFilter => Action::None,
        }
    }

    fn dismiss(&mut self) -> Action {
        match self.focus {
            PanelFocus::Prompt => {
                if self.prompt.mode() == Some(PromptMode::TreeFilter) {
                    self.clear_tree_filter();
                }
                self.prompt.deactivate();
                self.focus = self.previous_focus;
                Action::None
            }
            PanelFocus::Tree => {
                self.clear_tree_filter();
                Action::None
            }
            PanelFocus::Grid => {
                if matches!(self.tab().grid.target(), GridTarget::Search { .. }) {
                    return self.exit_table_search();
                }
                self.tab_mut().grid.clear_search();
                Action::None
            }
        }
    }

    // ── Tree ────────────────────────────────────────────────────

    /// Throw the tree away and load it again from the top
    pub fn reload_tree(&mut self) -> Action {
        self.tree_generation += 1;
        self.loading_node = None;
        let label = self.connection_name.clone().unwrap_or_default();
        self.tree = TreeModel::new(label);
        self.tree_browser = TreeBrowser::new();
        self.refresh_tree();
        Action::LoadDatabases {
            generation: self.tree_generation,
        }
    }

    fn refresh_tree(&mut self) {
        self.tree_browser.refresh(&self.tree, &self.matcher);
    }

    fn clear_tree_filter(&mut self) {
        if self.tree_browser.is_filtered() {
            self.tree_browser.clear_filter();
            self.refresh_tree();
        }
    }

    fn tree_action(&mut self, action: KeyAction) -> Action {
        let height = layout::tree_viewport(self.screen);
        match action {
            KeyAction::MoveUp => self.tree_browser.move_up(),
            KeyAction::MoveDown => self.tree_browser.move_down(),
            KeyAction::PageUp => self.tree_browser.page_up(height),
            KeyAction::PageDown => self.tree_browser.page_down(height),
            KeyAction::GoToTop | KeyAction::Home => self.tree_browser.go_to_top(),
            KeyAction::GoToBottom | KeyAction::End => self.tree_browser.go_to_bottom(),
            KeyAction::Select => return self.select_tree_node(),
            KeyAction::ToggleExpand => {
                if let Some(index) = self.tree_browser.selected_node() {
                    return self.change_expansion(index, false);
                }
            }
            KeyAction::Expand => {
                if let Some(index) = self.tree_browser.selected_node() {
                    return self.change_expansion(index, true);
                }
            }
            KeyAction::Collapse => self.collapse_or_parent(),
            KeyAction::Refresh => return self.reload_tree(),
            _ => {}
        }
        Action::None
    }

    fn select_tree_node(&mut self) -> Action {
        let Some(index) = self.tree_browser.selected_node() else {
            return Action::None;
        };
        if self.tree_browser.is_filtered() {
            self.reveal(index);
        }
        let Some(node_id) = self.tree.node(index).map(|n| n.id().to_string()) else {
            return Action::None;
        };
        self.on_node_selected(&node_id)
    }

    /// Expand every ancestor of `index` and drop the filter, keeping it selected
    fn reveal(&mut self, index: NodeIndex) {
        let path = self.tree.path(index);
        for &ancestor in path.iter().take(path.len().saturating_sub(1)) {
            self.tree.expand(ancestor);
        }
        self.tree_browser.clear_filter();
        self.refresh_tree();
        self.tree_browser.select_node(index);
    }

    fn collapse_or_parent(&mut self) {
        let Some(index) = self.tree_browser.selected_node() else {
            return;
        };
        if self.tree.collapse(index) == ToggleOutcome::Collapsed {
            self.refresh_tree();
            return;
        }
        let parent = self.tree.node(index).and_then(|n| n.parent());
        if let Some(parent) = parent
            && parent != self.tree.root()
        {
            self.tree_browser.select_node(parent);
        }
    }

    /// Toggle (or only expand) a node, issuing the lazy load it needs.
    /// Only one children load runs per tree; a second is refused.
    fn change_expansion(&mut self, index: NodeIndex, expand_only: bool) -> Action {
        let Some(node) = self.tree.node(index) else {
            return Action::None;
        };
        let needs_load =
            !node.is_loaded() && !node.kind().is_leaf() && node.kind() != NodeKind::Root;
        if needs_load && let Some(loading) = &self.loading_node {
            let message = if loading == node.id() {
                format!("Already loading {}", node.label())
            } else {
                format!("Still loading {}, try again shortly", loading)
            };
            self.set_status(message, StatusLevel::Info);
            return Action::None;
        }

        let outcome = if expand_only {
            self.tree.expand(index)
        } else {
            self.tree.toggle(index)
        };
        let action = match outcome {
            ToggleOutcome::NeedsLoad => self.request_children(index),
            _ => Action::None,
        };
        self.refresh_tree();
        action
    }

    fn request_children(&mut self, index: NodeIndex) -> Action {
        let Some(request) = self.children_request(index) else {
            self.tree.mark_load_failed(index);
            return Action::None;
        };
        let Some(node_id) = self.tree.node(index).map(|n| n.id().to_string()) else {
            return Action::None;
        };
        self.loading_node = Some(node_id.clone());
        Action::LoadNodeChildren {
            generation: self.tree_generation,
            node_id,
            request,
        }
    }

    /// Where in the catalog `index` lives, from its ancestors
    fn children_request(&self, index: NodeIndex) -> Option<ChildrenRequest> {
        let node = self.tree.node(index)?;
        let kind = node.kind();
        let database = self.tree.ancestor_label(index, NodeKind::Database)?.to_string();
        let schema = self
            .tree
            .ancestor_label(index, NodeKind::Schema)
            .map(str::to_string);
        let relation = (kind.is_relation() || kind == NodeKind::CompositeType)
            .then(|| node.label().to_string());
        Some(ChildrenRequest {
            kind,
            database,
            schema,
            relation,
        })
    }

    fn on_databases_loaded(
        &mut self,
        generation: u64,
        result: DbResult<Vec<NodeDescriptor>>,
    ) -> Action {
        if generation != self.tree_generation {
            tracing::debug!(generation, "databases for a replaced tree dropped");
            return Action::None;
        }
        match result {
            Ok(databases) => {
                let root = self.tree.root();
                if self.tree.node(root).is_some_and(|n| n.is_loaded()) {
                    return Action::None;
                }
                self.tree.add_children(root, databases);
                self.refresh_tree();
                if let Some(active) = self.tree.active_database() {
                    self.tree_browser.select_node(active);
                    return self.change_expansion(active, true);
                }
                Action::None
            }
            Err(e) => {
                self.report_failure("Loading databases", &e);
                Action::None
            }
        }
    }

    fn on_children_loaded(
        &mut self,
        generation: u64,
        node_id: &str,
        result: DbResult<Vec<NodeDescriptor>>,
    ) -> Action {
        if generation != self.tree_generation {
            tracing::debug!(node = %node_id, "children for a replaced tree dropped");
            return Action::None;
        }
        if self.loading_node.as_deref() == Some(node_id) {
            self.loading_node = None;
        }
        let Some(index) = self.tree.find_by_id(node_id) else {
            tracing::warn!(node = %node_id, "children for an unknown node dropped");
            return Action::None;
        };

        match result {
            Ok(children) => {
                if self.tree.node(index).is_some_and(|n| n.is_loaded()) {
                    tracing::debug!(node = %node_id, "node already loaded");
                    return Action::None;
                }
                let added = self.tree.add_children(index, children).len();
                tracing::debug!(node = %node_id, added, "children applied");
            }
            Err(e) => {
                self.tree.mark_load_failed(index);
                let what = self
                    .tree
                    .node(index)
                    .map(|n| format!("Loading {} {}", n.kind().display_name(), n.label()))
                    .unwrap_or_else(|| "Loading".to_string());
                self.report_failure(&what, &e);
            }
        }
        self.refresh_tree();
        Action::None
    }

    fn on_node_expanded(&mut self, node_id: &str, expanded: bool) -> Action {
        let Some(index) = self.tree.find_by_id(node_id) else {
            return Action::None;
        };
        if expanded {
            return self.change_expansion(index, true);
        }
        let selected = self.tree_browser.selected_node();
        self.tree.collapse(index);
        self.refresh_tree();
        // Selection inside the collapsed subtree moves up to it
        if selected.is_some_and(|s| self.tree.is_ancestor_of(index, s)) {
            self.tree_browser.select_node(index);
        }
        Action::None
    }

    /// Relations open in the grid; anything else toggles
    fn on_node_selected(&mut self, node_id: &str) -> Action {
        let Some(index) = self.tree.find_by_id(node_id) else {
            return Action::None;
        };
        let is_relation = self.tree.node(index).is_some_and(|n| n.is_selectable());
        if is_relation {
            self.open_relation(index)
        } else {
            self.change_expansion(index, false)
        }
    }

    fn open_relation(&mut self, index: NodeIndex) -> Action {
        let Some(node) = self.tree.node(index) else {
            return Action::None;
        };
        let (Some(database), Some(schema)) = (
            self.tree.ancestor_label(index, NodeKind::Database),
            self.tree.ancestor_label(index, NodeKind::Schema),
        ) else {
            return Action::None;
        };
        let target = GridTarget::Table {
            database: database.to_string(),
            schema: schema.to_string(),
            table: node.label().to_string(),
        };

        let idx = self.active_tab;
        let tab = &mut self.tabs[idx];
        if tab.grid.target() != &target {
            tab.reset_table_cache();
        }
        tab.grid.retarget(target);
        self.focus = PanelFocus::Grid;
        self.load_first_page(idx)
    }

    // ── Grid ────────────────────────────────────────────────────

    fn grid_action(&mut self, action: KeyAction) -> Action {
        let grid = &mut self.tabs[self.active_tab].grid;
        match action {
            KeyAction::MoveDown => grid.move_selection(1),
            KeyAction::MoveUp => grid.move_selection(-1),
            KeyAction::MoveLeft => grid.move_column(-1),
            KeyAction::MoveRight => grid.move_column(1),
            KeyAction::Home => grid.first_column(),
            KeyAction::End => grid.last_column(),
            KeyAction::PageDown => {
                let near_end = grid.page_down();
                return self.follow_up_load(near_end);
            }
            KeyAction::PageUp => grid.page_up(),
            KeyAction::HalfPageDown => {
                let half = (grid.visible_rows() / 2).max(1);
                grid.move_selection(half as isize);
                let near_end = grid.is_near_end();
                return self.follow_up_load(near_end);
            }
            KeyAction::HalfPageUp => {
                let half = (grid.visible_rows() / 2).max(1);
                grid.move_selection(-(half as isize));
            }
            KeyAction::ScrollDown => {
                let near_end = grid.scroll_viewport(1);
                return self.follow_up_load(near_end);
            }
            KeyAction::ScrollUp => {
                grid.scroll_viewport(-1);
            }
            KeyAction::GoToTop => return self.apply_motion(Motion::First(None)),
            KeyAction::GoToBottom => return self.apply_motion(Motion::Last(None)),
            KeyAction::TogglePin => self.toggle_pin(),
            KeyAction::CycleSort => return self.cycle_sort(),
            KeyAction::ToggleNullsFirst => return self.toggle_nulls_first(),
            KeyAction::NextMatch => self.step_match(true),
            KeyAction::PrevMatch => self.step_match(false),
            KeyAction::Refresh => return self.refresh_grid(),
            _ => return Action::None,
        }
        self.follow_up_load(false)
    }

    fn apply_motion(&mut self, motion: Motion) -> Action {
        match self.tab_mut().grid.apply_motion(motion) {
            MotionOutcome::Moved => self.follow_up_load(false),
            MotionOutcome::NeedsRows { target } => self.load_through(target),
        }
    }

    /// Extend the window far enough to reach row `target`
    fn load_through(&mut self, target: usize) -> Action {
        let idx = self.active_tab;
        let page_size = self.settings.grid.page_size;
        let tab = &mut self.tabs[idx];
        if tab.grid.is_paging() {
            tab.grid.clear_pending_jump();
            self.set_status("Still loading rows".to_string(), StatusLevel::Info);
            return Action::None;
        }
        if tab.grid.is_prefetching() {
            // A smaller prefetch landing first would make the jump page stale
            tab.load_generation += 1;
            tab.grid.set_prefetching(false);
        }
        let limit = (target + 1)
            .saturating_sub(tab.grid.row_count())
            .max(page_size);
        self.request_rows(idx, limit, false)
    }

    /// Prefetch or paginate after a cursor move, when the grid asks for it
    fn follow_up_load(&mut self, near_end: bool) -> Action {
        let grid = &self.tab().grid;
        if !grid.target().is_pageable() {
            return Action::None;
        }
        let more_remote = grid.row_count() < grid.total_rows()
            && !grid.is_paging()
            && !grid.is_prefetching();
        if grid.needs_prefetch() || (near_end && more_remote) {
            return self.request_rows(self.active_tab, self.settings.grid.page_size, true);
        }
        Action::None
    }

    /// Rows following the loaded window: from the cache when it has all of
    /// them, otherwise from the data source
    fn request_rows(&mut self, idx: usize, limit: usize, speculative: bool) -> Action {
        let tab = &mut self.tabs[idx];
        let Some(request) = tab.grid.next_page_request(limit) else {
            return Action::None;
        };
        if let Some(page) = tab.cached_page(&request) {
            tracing::debug!(tab_id = tab.id, offset = request.offset, "page served from cache");
            tab.grid.apply_page(request.offset, page);
            return Action::None;
        }
        let cache = Arc::clone(&tab.cache);
        if speculative {
            tab.grid.set_prefetching(true);
            Action::PrefetchData {
                tab_id: tab.id,
                generation: tab.load_generation,
                request,
                cache,
            }
        } else {
            tab.grid.set_paging(true);
            Action::LoadTableData {
                tab_id: tab.id,
                generation: tab.load_generation,
                request,
                cache,
            }
        }
    }

    /// Fresh offset-0 load for a table target, superseding anything in flight
    fn load_first_page(&mut self, idx: usize) -> Action {
        let tab = &mut self.tabs[idx];
        let Some(request) = tab.grid.first_page_request() else {
            return Action::None;
        };
        tab.invalidate_loads();
        tab.error = None;
        if let Some(page) = tab.cached_page(&request) {
            tab.grid.apply_page(0, page);
            return Action::None;
        }
        tab.grid.set_paging(true);
        Action::LoadTableData {
            tab_id: tab.id,
            generation: tab.load_generation,
            request,
            cache: Arc::clone(&tab.cache),
        }
    }

    fn on_page_loaded(
        &mut self,
        tab_id: usize,
        generation: u64,
        offset: usize,
        result: DbResult<PageData>,
        speculative: bool,
    ) -> Action {
        let Some(idx) = self.tab_index_by_id(tab_id) else {
            tracing::debug!(tab_id, "page for a closed tab dropped");
            return Action::None;
        };
        let tab = &mut self.tabs[idx];
        if generation != tab.load_generation {
            tracing::debug!(tab_id, offset, "stale page dropped");
            return Action::None;
        }
        if speculative {
            tab.grid.set_prefetching(false);
        } else {
            tab.grid.set_paging(false);
        }

        match result {
            Ok(page) => {
                tab.table_shape = Some((page.columns.clone(), page.total_rows));
                if tab.grid.apply_page(offset, page) == PageApply::Stale {
                    tracing::debug!(tab_id, offset, "page no longer continues the window");
                }
            }
            Err(e) if speculative => {
                tracing::warn!(tab_id, offset, error = %e, "prefetch failed");
            }
            Err(e) => {
                if e.kind() != ErrorKind::Cancelled {
                    tab.grid.clear_pending_jump();
                    if offset == 0 {
                        tab.error = Some(e.to_string());
                    }
                }
                self.report_failure("Load", &e);
            }
        }
        Action::None
    }

    fn toggle_pin(&mut self) {
        let grid = &mut self.tab_mut().grid;
        let row = grid.selected_row() + 1;
        match grid.toggle_pin() {
            Ok(PinChange::Pinned) => self.set_status(format!("Pinned row {}", row), StatusLevel::Info),
            Ok(PinChange::Unpinned) => {
                self.set_status(format!("Unpinned row {}", row), StatusLevel::Info)
            }
            Err(e) => self.set_status(e.to_string(), StatusLevel::Warning),
        }
    }

    fn cycle_sort(&mut self) -> Action {
        let spec = self.tab_mut().grid.cycle_sort().cloned();
        let message = match spec {
            Some(spec) => format!("Sort: {}", spec),
            None => "Sort cleared".to_string(),
        };
        self.set_status(message, StatusLevel::Info);
        self.reload_sorted()
    }

    fn toggle_nulls_first(&mut self) -> Action {
        if !self.tab_mut().grid.toggle_nulls_first() {
            self.set_status("No active sort".to_string(), StatusLevel::Info);
            return Action::None;
        }
        self.reload_sorted()
    }

    /// Ordering is applied remotely, so a sort change means a fresh load.
    /// Query results are not re-run.
    fn reload_sorted(&mut self) -> Action {
        let idx = self.active_tab;
        let tab = &mut self.tabs[idx];
        if !tab.grid.target().is_pageable() {
            self.set_status(
                "Sorting applies to table data; results are unchanged".to_string(),
                StatusLevel::Info,
            );
            return Action::None;
        }
        tab.reset_table_cache();
        self.load_first_page(idx)
    }

    fn refresh_grid(&mut self) -> Action {
        let idx = self.active_tab;
        match self.tabs[idx].grid.target().clone() {
            GridTarget::Table { .. } => {
                self.tabs[idx].reset_table_cache();
                self.load_first_page(idx)
            }
            GridTarget::Query { sql } if !sql.is_empty() => self.execute_sql(&sql),
            GridTarget::Search { query, .. } => self.search_table(&query),
            GridTarget::Query { .. } => Action::None,
        }
    }

    fn search_loaded(&mut self, query: &str) {
        let grid = &mut self.tab_mut().grid;
        if query.is_empty() {
            grid.clear_search();
            return;
        }
        if grid.find(query).is_some() {
            self.report_match();
        } else {
            self.set_status(format!("Pattern not found: {}", query), StatusLevel::Warning);
        }
    }

    fn step_match(&mut self, forward: bool) {
        let grid = &mut self.tab_mut().grid;
        let hit = if forward {
            grid.next_match()
        } else {
            grid.prev_match()
        };
        if hit.is_some() {
            self.report_match();
        } else {
            self.set_status("No search matches".to_string(), StatusLevel::Info);
        }
    }

    fn report_match(&mut self) {
        let search = self.tab().grid.search();
        if let Some(active) = search.active_index() {
            let message = format!("Match {}/{}", active + 1, search.matches().len());
            self.set_status(message, StatusLevel::Info);
        }
    }

    fn search_table(&mut self, query: &str) -> Action {
        if query.is_empty() {
            return Action::None;
        }
        let limit = self.settings.grid.page_size;
        let tab = self.tab_mut();
        let Some(GridTarget::Table {
            database,
            schema,
            table,
        }) = tab.grid.target().table_target()
        else {
            self.set_status(
                "Table search needs a table or view".to_string(),
                StatusLevel::Warning,
            );
            return Action::None;
        };
        // Leaving the table drops its sort, so sorted cache rows would lie
        if tab.grid.sort().is_some() {
            tab.reset_table_cache();
        }
        tab.invalidate_loads();
        tab.grid.set_paging(true);
        Action::SearchTable {
            tab_id: tab.id,
            generation: tab.load_generation,
            request: SearchRequest {
                database,
                schema,
                table,
                query: query.to_string(),
                limit,
            },
        }
    }

    fn on_search_result(
        &mut self,
        tab_id: usize,
        generation: u64,
        query: String,
        result: DbResult<PageData>,
    ) -> Action {
        let Some(idx) = self.tab_index_by_id(tab_id) else {
            return Action::None;
        };
        let tab = &mut self.tabs[idx];
        if generation != tab.load_generation {
            tracing::debug!(tab_id, "stale search result dropped");
            return Action::None;
        }
        tab.grid.set_paging(false);
        match result {
            Ok(page) => {
                let Some(GridTarget::Table {
                    database,
                    schema,
                    table,
                }) = tab.grid.target().table_target()
                else {
                    return Action::None;
                };
                tab.grid.retarget(GridTarget::Search {
                    database,
                    schema,
                    table,
                    query,
                });
                let hits = page.total_rows;
                tab.grid.replace(page.columns, page.rows, page.total_rows);
                self.set_status(format!("{} matching rows", hits), StatusLevel::Success);
            }
            Err(e) => self.report_failure("Search", &e),
        }
        Action::None
    }

    fn exit_table_search(&mut self) -> Action {
        let idx = self.active_tab;
        let Some(target) = self.tabs[idx].grid.target().table_target() else {
            return Action::None;
        };
        self.tabs[idx].grid.retarget(target);
        self.load_first_page(idx)
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Run a statement in the active tab. Any statement already running is
    /// superseded and its result will be dropped.
    pub fn execute_sql(&mut self, sql: &str) -> Action {
        let sql = sql.trim();
        if sql.is_empty() {
            return Action::None;
        }
        let query_id = self.next_query_id;
        self.next_query_id += 1;
        for tab in &mut self.tabs {
            tab.query_running = false;
            tab.pending_query = None;
        }
        let tab = self.tab_mut();
        tab.query_running = true;
        tab.pending_query = Some(query_id);
        let tab_id = tab.id;
        self.set_status("Running query…".to_string(), StatusLevel::Info);
        Action::ExecuteQuery {
            tab_id,
            query_id,
            sql: sql.to_string(),
        }
    }

    fn cancel_query(&mut self) -> Action {
        let mut cancelled = false;
        for tab in &mut self.tabs {
            if tab.query_running {
                tab.query_running = false;
                tab.pending_query = None;
                cancelled = true;
            }
        }
        if !cancelled {
            return Action::None;
        }
        self.set_status("Query cancelled".to_string(), StatusLevel::Warning);
        Action::CancelQuery
    }

    fn on_query_result(
        &mut self,
        tab_id: usize,
        query_id: u64,
        sql: String,
        result: DbResult<QueryOutput>,
    ) -> Action {
        let Some(idx) = self.tab_index_by_id(tab_id) else {
            return Action::None;
        };
        let tab = &mut self.tabs[idx];
        if tab.pending_query != Some(query_id) {
            tracing::debug!(tab_id, query_id, "superseded query result dropped");
            return Action::None;
        }
        tab.pending_query = None;
        tab.query_running = false;

        match result {
            // The current view stays as it was
            Err(e) => self.report_failure("Query", &e),
            Ok(output) => {
                tab.invalidate_loads();
                tab.error = None;
                tab.grid.retarget(GridTarget::Query { sql });
                let elapsed = output.duration.as_secs_f64() * 1000.0;
                let message = if output.columns.is_empty() {
                    format!("{} rows affected in {:.1}ms", output.rows_affected, elapsed)
                } else {
                    format!("{} rows in {:.1}ms", output.rows.len(), elapsed)
                };
                let count = output.rows.len();
                tab.grid.replace(output.columns, output.rows, count);
                if idx == self.active_tab {
                    self.focus = PanelFocus::Grid;
                }
                self.set_status(message, StatusLevel::Success);
            }
        }
        Action::None
    }

    // ── Tabs ────────────────────────────────────────────────────

    /// Open a new tab and switch to it. Returns false if at capacity.
    fn new_tab(&mut self) -> bool {
        if self.tabs.len() >= self.settings.ui.max_tabs {
            return false;
        }
        let id = self.next_tab_id;
        self.next_tab_id += 1;
        self.tabs.push(Tab::new(id, &self.settings));
        self.active_tab = self.tabs.len() - 1;
        self.focus = PanelFocus::Grid;
        true
    }

    /// Close the active tab, cancelling its query. The last tab stays open.
    fn close_tab(&mut self) -> Action {
        if self.tabs.len() <= 1 {
            self.set_status("Cannot close the last tab".to_string(), StatusLevel::Info);
            return Action::None;
        }
        let closed = self.tabs.remove(self.active_tab);
        if self.active_tab >= self.tabs.len() {
            self.active_tab = self.tabs.len() - 1;
        }
        if closed.query_running {
            Action::CancelQuery
        } else {
            Action::None
        }
    }

    /// Cycle to the next tab, wrapping around.
    fn next_tab(&mut self) {
        if self.tabs.len() > 1 {
            self.active_tab = (self.active_tab + 1) % self.tabs.len();
        }
    }

    /// Fit every grid and the tree list to the current screen
    fn sync_viewports(&mut self) {
        self.tree_browser
            .ensure_visible(layout::tree_viewport(self.screen));
        for tab in &mut self.tabs {
            let (rows, width) = layout::grid_viewport(self.screen, tab.grid.pins().len());
            tab.grid.set_viewport(rows, width);
        }
    }
}
