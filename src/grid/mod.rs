//! Virtualized data grid
//!
//! Holds a window of loaded rows out of a possibly much larger remote result
//! and tracks which part of it is on screen. Nothing here scans more than the
//! loaded window, and column sizing only looks at a bounded sample.
//!
//! Cursor-driven operations keep `top_row <= selected_row < top_row + visible_rows`.

pub mod cell;
pub mod columns;
pub mod motion;
pub mod pin;
pub mod search;

pub use motion::{Motion, MotionInput, MotionState};
pub use pin::{PinChange, PinnedRow, PinnedRows};
pub use search::{MatchPos, SearchState};

use crate::config::GridSettings;
use crate::db::types::{PageData, PageRequest, SortDirection, SortSpec};
use crate::error::{GridError, GridResult};
use columns::WidthLimits;

/// What a grid is showing, used to build follow-up requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridTarget {
    Table {
        database: String,
        schema: String,
        table: String,
    },
    Query {
        sql: String,
    },
    /// Table-wide search hits for `query`
    Search {
        database: String,
        schema: String,
        table: String,
        query: String,
    },
}

impl GridTarget {
    pub fn title(&self) -> String {
        match self {
            GridTarget::Table { schema, table, .. } => format!("{}.{}", schema, table),
            GridTarget::Query { sql } => {
                let first_line = sql.lines().next().unwrap_or_default();
                cell::hard_truncate(first_line, 30).to_string()
            }
            GridTarget::Search { table, query, .. } => format!("{} ?{}", table, query),
        }
    }

    /// Only tables and views can be paged
    pub fn is_pageable(&self) -> bool {
        matches!(self, GridTarget::Table { .. })
    }

    /// The table behind a table or search target
    pub fn table_target(&self) -> Option<GridTarget> {
        match self {
            GridTarget::Table { .. } => Some(self.clone()),
            GridTarget::Search {
                database,
                schema,
                table,
                ..
            } => Some(GridTarget::Table {
                database: database.clone(),
                schema: schema.clone(),
                table: table.clone(),
            }),
            GridTarget::Query { .. } => None,
        }
    }
}

/// How a page response was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageApply {
    Replaced,
    Appended,
    /// Offset no longer matches the loaded window
    Stale,
}

/// Result of a row motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    Moved,
    /// Target lies past the loaded rows; the cursor moves once they arrive
    NeedsRows { target: usize },
}

pub struct GridState {
    target: GridTarget,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    total_rows: usize,

    selected_row: usize,
    selected_col: usize,
    top_row: usize,
    visible_rows: usize,
    left_col: usize,
    visible_cols: usize,
    available_width: u16,
    col_widths: Vec<u16>,

    sort: Option<SortSpec>,
    search: SearchState,
    pins: PinnedRows,
    motion: MotionState,

    prefetch_in_flight: bool,
    paging_in_flight: bool,
    pending_jump: Option<usize>,

    settings: GridSettings,
}

impl GridState {
    pub fn new(target: GridTarget, settings: &GridSettings, motion: MotionState) -> Self {
        Self {
            target,
            columns: Vec::new(),
            rows: Vec::new(),
            total_rows: 0,
            selected_row: 0,
            selected_col: 0,
            top_row: 0,
            visible_rows: 1,
            left_col: 0,
            visible_cols: 0,
            available_width: 0,
            col_widths: Vec::new(),
            sort: None,
            search: SearchState::default(),
            pins: PinnedRows::new(settings.max_pinned_rows),
            motion,
            prefetch_in_flight: false,
            paging_in_flight: false,
            pending_jump: None,
            settings: settings.clone(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn target(&self) -> &GridTarget {
        &self.target
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn selected_col(&self) -> usize {
        self.selected_col
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn left_col(&self) -> usize {
        self.left_col
    }

    pub fn visible_cols(&self) -> usize {
        self.visible_cols
    }

    pub fn col_widths(&self) -> &[u16] {
        &self.col_widths
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn pins(&self) -> &PinnedRows {
        &self.pins
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionState {
        &mut self.motion
    }

    pub fn is_paging(&self) -> bool {
        self.paging_in_flight
    }

    pub fn is_prefetching(&self) -> bool {
        self.prefetch_in_flight
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    // ── Loading ─────────────────────────────────────────────────

    /// Apply a page that starts at `offset`. Offset 0 replaces the window
    /// and resets the cursor; any other offset must continue the window.
    pub fn apply_page(&mut self, offset: usize, page: PageData) -> PageApply {
        if offset == 0 {
            self.replace(page.columns, page.rows, page.total_rows);
            return PageApply::Replaced;
        }
        if offset != self.rows.len() {
            return PageApply::Stale;
        }
        self.rows.extend(page.rows);
        self.total_rows = page.total_rows.max(self.rows.len());
        if let Some(target) = self.pending_jump.take() {
            let row = target.min(self.rows.len().saturating_sub(1));
            self.jump_to(row);
        }
        PageApply::Appended
    }

    /// Replace the whole window, e.g. with a query result or search hits.
    /// Pins refer to row positions of the old window and are dropped.
    pub fn replace(&mut self, columns: Vec<String>, rows: Vec<Vec<String>>, total_rows: usize) {
        self.pins.clear();
        if columns != self.columns {
            self.selected_col = 0;
            self.left_col = 0;
        }
        self.columns = columns;
        self.rows = rows;
        self.total_rows = total_rows.max(self.rows.len());
        self.selected_row = 0;
        self.top_row = 0;
        self.pending_jump = None;
        self.selected_col = self.selected_col.min(self.columns.len().saturating_sub(1));
        self.search.clear();
        self.recompute_widths();
    }

    /// Change what the grid shows; rows are kept until the first page lands
    pub fn retarget(&mut self, target: GridTarget) {
        if target != self.target {
            self.sort = None;
        }
        self.target = target;
    }

    pub fn set_paging(&mut self, in_flight: bool) {
        self.paging_in_flight = in_flight;
    }

    pub fn set_prefetching(&mut self, in_flight: bool) {
        self.prefetch_in_flight = in_flight;
    }

    /// Request for the page following the loaded window
    pub fn next_page_request(&self, limit: usize) -> Option<PageRequest> {
        let GridTarget::Table {
            database,
            schema,
            table,
        } = &self.target
        else {
            return None;
        };
        Some(PageRequest {
            database: database.clone(),
            schema: schema.clone(),
            table: table.clone(),
            offset: self.rows.len(),
            limit,
            sort: self.sort.clone(),
            known_total: (!self.rows.is_empty()).then_some(self.total_rows),
        })
    }

    /// Request for a fresh load from offset 0
    pub fn first_page_request(&self) -> Option<PageRequest> {
        self.next_page_request(self.settings.page_size)
            .map(|req| PageRequest {
                offset: 0,
                known_total: None,
                ..req
            })
    }

    /// Speculative load is worthwhile: nothing in flight, and fewer than
    /// `prefetch_threshold` loaded rows remain below the cursor while more exist remotely.
    pub fn needs_prefetch(&self) -> bool {
        if self.paging_in_flight || self.prefetch_in_flight {
            return false;
        }
        let threshold = self.settings.prefetch_threshold;
        if threshold == 0 {
            return false;
        }
        let loaded = self.rows.len();
        let below = loaded.saturating_sub(self.selected_row + 1);
        below < threshold && loaded < self.total_rows
    }

    /// Bottom of the window is within `near_end_margin` rows of the loaded boundary
    pub fn is_near_end(&self) -> bool {
        self.top_row + self.visible_rows + self.settings.near_end_margin >= self.rows.len()
    }

    // ── Layout ──────────────────────────────────────────────────

    /// Update the on-screen size; called on every render pass
    pub fn set_viewport(&mut self, visible_rows: usize, width: u16) {
        self.visible_rows = visible_rows.max(1);
        self.available_width = width;
        self.clamp_top();
        self.scroll_to_selected_col();
    }

    fn recompute_widths(&mut self) {
        let limits = WidthLimits {
            min: self.settings.min_column_width,
            max: self.settings.max_column_width,
            sample_rows: self.settings.width_sample_rows,
            sample_bytes: self.settings.width_sample_bytes,
        };
        self.col_widths = columns::compute_widths(&self.columns, &self.rows, limits);
        self.scroll_to_selected_col();
    }

    fn update_visible_cols(&mut self) {
        self.visible_cols =
            columns::visible_count(&self.col_widths, self.left_col, self.available_width);
    }

    fn scroll_to_selected_col(&mut self) {
        if self.columns.is_empty() {
            self.left_col = 0;
            self.visible_cols = 0;
            return;
        }
        self.left_col = self.left_col.min(self.columns.len() - 1);
        if self.selected_col < self.left_col {
            self.left_col = self.selected_col;
        }
        self.update_visible_cols();
        if self.selected_col >= self.left_col + self.visible_cols {
            self.left_col = columns::left_for_rightmost(
                &self.col_widths,
                self.selected_col,
                self.available_width,
            );
            self.update_visible_cols();
        }
    }

    fn clamp_top(&mut self) {
        let max_top = self.rows.len().saturating_sub(self.visible_rows);
        self.top_row = self.top_row.min(max_top);
        self.keep_cursor_visible();
    }

    fn keep_cursor_visible(&mut self) {
        if self.selected_row < self.top_row {
            self.top_row = self.selected_row;
        } else if self.selected_row >= self.top_row + self.visible_rows {
            self.top_row = self.selected_row + 1 - self.visible_rows;
        }
    }

    // ── Vertical movement ───────────────────────────────────────

    /// Move the cursor by `delta` rows, sliding the window minimally
    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        let target = self.selected_row.saturating_add_signed(delta).min(last);
        self.selected_row = target;
        self.keep_cursor_visible();
    }

    /// Move the window by `delta` rows without moving the cursor unless it
    /// would leave the window. Returns true when near the loaded boundary.
    pub fn scroll_viewport(&mut self, delta: isize) -> bool {
        if self.rows.is_empty() {
            return false;
        }
        let max_top = self.rows.len().saturating_sub(self.visible_rows);
        self.top_row = self.top_row.saturating_add_signed(delta).min(max_top);
        let bottom = (self.top_row + self.visible_rows - 1).min(self.rows.len() - 1);
        self.selected_row = self.selected_row.clamp(self.top_row, bottom);
        self.is_near_end()
    }

    pub fn page_down(&mut self) -> bool {
        self.move_selection(self.visible_rows as isize);
        self.is_near_end()
    }

    pub fn page_up(&mut self) {
        self.move_selection(-(self.visible_rows as isize));
    }

    fn jump_to(&mut self, row: usize) {
        let delta = row as isize - self.selected_row as isize;
        self.move_selection(delta);
    }

    /// Apply a vim-style motion. Rows beyond the loaded window are
    /// requested instead of clamped, up to `max_jump_rows` past the window.
    pub fn apply_motion(&mut self, motion: Motion) -> MotionOutcome {
        match motion {
            Motion::Down(n) => self.move_selection(n as isize),
            Motion::Up(n) => self.move_selection(-(n as isize)),
            Motion::First(None) => self.jump_to(0),
            Motion::First(Some(n)) | Motion::Last(Some(n)) => {
                let row = n.saturating_sub(1);
                if row >= self.rows.len() && self.rows.len() < self.total_rows {
                    let cap = self.rows.len() + self.settings.max_jump_rows.saturating_sub(1);
                    let target = row.min(self.total_rows - 1).min(cap);
                    self.pending_jump = Some(target);
                    return MotionOutcome::NeedsRows { target };
                }
                self.jump_to(row.min(self.rows.len().saturating_sub(1)));
            }
            Motion::Last(None) => self.jump_to(self.rows.len().saturating_sub(1)),
        }
        MotionOutcome::Moved
    }

    pub fn pending_jump(&self) -> Option<usize> {
        self.pending_jump
    }

    pub fn clear_pending_jump(&mut self) {
        self.pending_jump = None;
    }

    // ── Horizontal movement ─────────────────────────────────────

    pub fn move_column(&mut self, delta: isize) {
        if self.columns.is_empty() {
            return;
        }
        let last = self.columns.len() - 1;
        self.selected_col = self.selected_col.saturating_add_signed(delta).min(last);
        self.scroll_to_selected_col();
    }

    pub fn first_column(&mut self) {
        self.selected_col = 0;
        self.left_col = 0;
        self.update_visible_cols();
    }

    pub fn last_column(&mut self) {
        if self.columns.is_empty() {
            return;
        }
        self.selected_col = self.columns.len() - 1;
        self.left_col =
            columns::left_for_rightmost(&self.col_widths, self.selected_col, self.available_width);
        self.update_visible_cols();
    }

    // ── Search ──────────────────────────────────────────────────

    /// Search the loaded window and jump to the first hit at or after the cursor
    pub fn find(&mut self, query: &str) -> Option<MatchPos> {
        self.search.run(query, &self.rows);
        let from = MatchPos {
            row: self.selected_row,
            col: self.selected_col,
        };
        let hit = self.search.activate_from(from)?;
        self.focus(hit);
        Some(hit)
    }

    pub fn next_match(&mut self) -> Option<MatchPos> {
        let hit = self.search.next()?;
        self.focus(hit);
        Some(hit)
    }

    pub fn prev_match(&mut self) -> Option<MatchPos> {
        let hit = self.search.prev()?;
        self.focus(hit);
        Some(hit)
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Put the cursor on `pos` and center both axes on it
    fn focus(&mut self, pos: MatchPos) {
        if pos.row >= self.rows.len() || pos.col >= self.columns.len() {
            return;
        }
        self.selected_row = pos.row;
        let max_top = self.rows.len().saturating_sub(self.visible_rows);
        self.top_row = pos.row.saturating_sub(self.visible_rows / 2).min(max_top);
        self.keep_cursor_visible();

        self.selected_col = pos.col;
        let half = u32::from(self.available_width) / 2;
        let mut left = pos.col;
        let mut used = u32::from(self.col_widths.get(pos.col).copied().unwrap_or(0)) / 2;
        while left > 0 {
            let w = u32::from(self.col_widths[left - 1]) + u32::from(columns::COLUMN_SEPARATOR);
            if used + w > half {
                break;
            }
            used += w;
            left -= 1;
        }
        self.left_col = left;
        self.scroll_to_selected_col();
    }

    // ── Pinning ─────────────────────────────────────────────────

    /// Pin or unpin the cursor row
    pub fn toggle_pin(&mut self) -> GridResult<PinChange> {
        let values = self.rows.get(self.selected_row).ok_or(GridError::NoRows)?;
        self.pins.toggle(self.selected_row, values)
    }

    // ── Sorting ─────────────────────────────────────────────────

    /// Cycle the selected column through ascending, descending and unsorted.
    /// Returns the new ordering; the caller reloads from offset 0.
    pub fn cycle_sort(&mut self) -> Option<&SortSpec> {
        let column = self.columns.get(self.selected_col)?.clone();
        self.sort = match self.sort.take() {
            Some(spec) if spec.column == column => match spec.direction {
                SortDirection::Ascending => Some(SortSpec {
                    direction: SortDirection::Descending,
                    ..spec
                }),
                SortDirection::Descending => None,
            },
            previous => Some(SortSpec {
                column,
                direction: SortDirection::Ascending,
                nulls_first: previous.is_some_and(|p| p.nulls_first),
            }),
        };
        self.sort.as_ref()
    }

    /// Flip null ordering of the active sort. False when unsorted.
    pub fn toggle_nulls_first(&mut self) -> bool {
        match &mut self.sort {
            Some(spec) => {
                spec.nulls_first = !spec.nulls_first;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> GridSettings {
        GridSettings {
            max_pinned_rows: 2,
            prefetch_threshold: 3,
            near_end_margin: 1,
            ..GridSettings::default()
        }
    }

    fn grid_with(rows: usize, total: usize) -> GridState {
        let mut grid = GridState::new(
            GridTarget::Table {
                database: "app".into(),
                schema: "public".into(),
                table: "users".into(),
            },
            &settings(),
            MotionState::new(Duration::from_millis(1500)),
        );
        grid.apply_page(
            0,
            PageData {
                columns: vec!["id".into(), "name".into(), "email".into()],
                rows: (0..rows)
                    .map(|i| vec![i.to_string(), format!("user{}", i), format!("u{}@x.io", i)])
                    .collect(),
                total_rows: total,
            },
        );
        grid
    }

    fn assert_window(grid: &GridState) {
        assert!(grid.top_row() <= grid.selected_row());
        assert!(grid.selected_row() < grid.top_row() + grid.visible_rows());
        if grid.row_count() > 0 {
            assert!(grid.selected_row() < grid.row_count());
        }
    }

    #[test]
    fn test_move_selection_slides_window() {
        let mut grid = grid_with(3, 3);
        grid.set_viewport(2, 80);
        grid.move_selection(1);
        assert_eq!((grid.selected_row(), grid.top_row()), (1, 0));
        grid.move_selection(1);
        assert_eq!((grid.selected_row(), grid.top_row()), (2, 1));
        grid.move_selection(10);
        assert_eq!(grid.selected_row(), 2);
        grid.move_selection(-10);
        assert_eq!((grid.selected_row(), grid.top_row()), (0, 0));
    }

    #[test]
    fn test_cursor_window_invariant_under_mixed_ops() {
        let mut grid = grid_with(50, 50);
        grid.set_viewport(7, 80);
        let ops: [(bool, isize); 12] = [
            (true, 5),
            (false, 20),
            (true, -3),
            (false, -40),
            (true, 100),
            (false, 3),
            (true, -1),
            (false, 100),
            (true, -25),
            (false, -2),
            (true, 0),
            (false, 0),
        ];
        for (is_move, delta) in ops {
            if is_move {
                grid.move_selection(delta);
            } else {
                grid.scroll_viewport(delta);
            }
            assert_window(&grid);
        }
    }

    #[test]
    fn test_scroll_viewport_keeps_cursor_unless_pushed_out() {
        let mut grid = grid_with(20, 20);
        grid.set_viewport(5, 80);
        grid.move_selection(2);
        grid.scroll_viewport(1);
        assert_eq!((grid.top_row(), grid.selected_row()), (1, 2));
        grid.scroll_viewport(5);
        assert_eq!((grid.top_row(), grid.selected_row()), (6, 6));
        grid.scroll_viewport(100);
        assert_eq!(grid.top_row(), 15);
    }

    #[test]
    fn test_scroll_viewport_near_end() {
        let mut grid = grid_with(20, 100);
        grid.set_viewport(5, 80);
        assert!(!grid.scroll_viewport(5));
        assert!(grid.scroll_viewport(9));
    }

    #[test]
    fn test_empty_grid_is_safe() {
        let mut grid = grid_with(0, 0);
        grid.set_viewport(5, 80);
        grid.move_selection(3);
        assert!(!grid.scroll_viewport(3));
        assert_eq!(grid.toggle_pin(), Err(GridError::NoRows));
        assert!(!grid.needs_prefetch());
        assert_window(&grid);
    }

    #[test]
    fn test_pin_scenario() {
        let mut grid = grid_with(3, 3);
        assert_eq!(grid.toggle_pin(), Ok(PinChange::Pinned));
        grid.move_selection(1);
        assert_eq!(grid.toggle_pin(), Ok(PinChange::Pinned));
        grid.move_selection(1);
        assert_eq!(grid.toggle_pin(), Err(GridError::PinLimit { max: 2 }));
        assert_eq!(grid.pins().len(), 2);
        grid.move_selection(-2);
        assert_eq!(grid.toggle_pin(), Ok(PinChange::Unpinned));
        assert_eq!(grid.pins().len(), 1);
    }

    #[test]
    fn test_reload_drops_pins() {
        let mut grid = grid_with(3, 3);
        assert_eq!(grid.toggle_pin(), Ok(PinChange::Pinned));

        // Same columns, different order
        grid.apply_page(
            0,
            PageData {
                columns: vec!["id".into(), "name".into(), "email".into()],
                rows: (0..3)
                    .rev()
                    .map(|i| vec![i.to_string(), format!("user{}", i), format!("u{}@x.io", i)])
                    .collect(),
                total_rows: 3,
            },
        );
        assert!(grid.pins().is_empty());
        assert!(!grid.pins().is_pinned(0));
        assert_eq!(grid.toggle_pin(), Ok(PinChange::Pinned));
        assert_eq!(grid.pins().rows()[0].values[0], "2");
    }

    #[test]
    fn test_needs_prefetch() {
        let mut grid = grid_with(10, 100);
        assert!(!grid.needs_prefetch());
        grid.move_selection(7);
        // 2 rows below the cursor, threshold 3
        assert!(grid.needs_prefetch());
        grid.set_prefetching(true);
        assert!(!grid.needs_prefetch());
        grid.set_prefetching(false);
        grid.set_paging(true);
        assert!(!grid.needs_prefetch());

        let mut full = grid_with(10, 10);
        full.move_selection(9);
        assert!(!full.needs_prefetch());
    }

    #[test]
    fn test_append_and_stale_pages() {
        let mut grid = grid_with(3, 6);
        let page = PageData {
            columns: vec!["id".into(), "name".into(), "email".into()],
            rows: vec![vec!["3".into(), "c".into(), "d".into()]],
            total_rows: 6,
        };
        assert_eq!(grid.apply_page(5, page.clone()), PageApply::Stale);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.apply_page(3, page), PageApply::Appended);
        assert_eq!(grid.row_count(), 4);
    }

    #[test]
    fn test_replace_resets_cursor() {
        let mut grid = grid_with(10, 10);
        grid.set_viewport(3, 80);
        grid.move_selection(8);
        grid.apply_page(
            0,
            PageData {
                columns: vec!["id".into(), "name".into(), "email".into()],
                rows: vec![vec!["0".into(), "a".into(), "b".into()]],
                total_rows: 1,
            },
        );
        assert_eq!((grid.selected_row(), grid.top_row()), (0, 0));
    }

    #[test]
    fn test_jump_past_loaded_window() {
        let mut grid = grid_with(10, 1000);
        grid.set_viewport(5, 80);
        assert_eq!(
            grid.apply_motion(Motion::Last(Some(50))),
            MotionOutcome::NeedsRows { target: 49 }
        );
        assert_eq!(grid.selected_row(), 0);
        let page = PageData {
            columns: grid.columns().to_vec(),
            rows: (10..50).map(|i| vec![i.to_string(), "n".into(), "e".into()]).collect(),
            total_rows: 1000,
        };
        grid.apply_page(10, page);
        assert_eq!(grid.selected_row(), 49);
        assert_window(&grid);
        assert_eq!(grid.pending_jump(), None);
    }

    #[test]
    fn test_jump_within_loaded_window() {
        let mut grid = grid_with(10, 10);
        grid.set_viewport(4, 80);
        assert_eq!(grid.apply_motion(Motion::Last(None)), MotionOutcome::Moved);
        assert_eq!(grid.selected_row(), 9);
        grid.apply_motion(Motion::First(Some(3)));
        assert_eq!(grid.selected_row(), 2);
        grid.apply_motion(Motion::Last(Some(500)));
        assert_eq!(grid.selected_row(), 9);
        grid.apply_motion(Motion::First(None));
        assert_eq!(grid.selected_row(), 0);
    }

    #[test]
    fn test_horizontal_scrolling() {
        let mut grid = grid_with(3, 3);
        // widths: id=4, name=5, email=7
        grid.set_viewport(3, 12);
        assert_eq!(grid.visible_cols(), 2);
        grid.move_column(2);
        assert_eq!(grid.selected_col(), 2);
        assert!(grid.left_col() + grid.visible_cols() > 2);
        assert!(grid.left_col() + grid.visible_cols() <= grid.column_count());
        grid.first_column();
        assert_eq!((grid.selected_col(), grid.left_col()), (0, 0));
        grid.last_column();
        assert_eq!(grid.left_col(), grid.column_count() - grid.visible_cols());
    }

    #[test]
    fn test_search_centers_on_match() {
        let mut grid = grid_with(40, 40);
        grid.set_viewport(10, 80);
        let hit = grid.find("user30");
        assert_eq!(hit, Some(MatchPos { row: 30, col: 1 }));
        assert_eq!(grid.selected_row(), 30);
        assert_eq!(grid.top_row(), 25);
        assert_window(&grid);
        assert_eq!(grid.next_match(), Some(MatchPos { row: 30, col: 1 }));
        assert!(grid.find("nothing").is_none());
    }

    #[test]
    fn test_search_with_very_wide_columns() {
        let wide = GridSettings {
            min_column_width: 65_000,
            max_column_width: u16::MAX,
            ..settings()
        };
        let mut grid = GridState::new(
            GridTarget::Query {
                sql: "select 1".into(),
            },
            &wide,
            MotionState::new(Duration::from_millis(1500)),
        );
        grid.replace(
            vec!["id".into(), "name".into(), "email".into()],
            vec![vec!["1".into(), "ann".into(), "ann@x.io".into()]],
            1,
        );
        grid.set_viewport(10, u16::MAX);
        assert_eq!(grid.find("ann@x"), Some(MatchPos { row: 0, col: 2 }));
        assert_eq!(grid.selected_col(), 2);
    }

    #[test]
    fn test_sort_cycle() {
        let mut grid = grid_with(3, 3);
        grid.move_column(1);
        assert_eq!(
            grid.cycle_sort().map(|s| s.direction),
            Some(SortDirection::Ascending)
        );
        assert!(grid.toggle_nulls_first());
        let spec = grid.cycle_sort().cloned();
        assert_eq!(spec.as_ref().map(|s| s.direction), Some(SortDirection::Descending));
        assert!(spec.is_some_and(|s| s.nulls_first && s.column == "name"));
        assert!(grid.cycle_sort().is_none());
        assert!(!grid.toggle_nulls_first());
    }

    #[test]
    fn test_page_requests_carry_sort() {
        let mut grid = grid_with(3, 10);
        grid.cycle_sort();
        let next = grid.next_page_request(50).unwrap();
        assert_eq!(next.offset, 3);
        assert_eq!(next.limit, 50);
        assert_eq!(next.sort.map(|s| s.column), Some("id".to_string()));
        assert_eq!(next.known_total, Some(10));
        let first = grid.first_page_request().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.known_total, None);
    }

    #[test]
    fn test_query_target_not_pageable() {
        let grid = GridState::new(
            GridTarget::Query {
                sql: "select 1".into(),
            },
            &settings(),
            MotionState::new(Duration::from_millis(1500)),
        );
        assert!(grid.next_page_request(10).is_none());
        assert!(!grid.target().is_pageable());
    }
}
