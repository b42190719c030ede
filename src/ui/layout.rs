//! Panel layout management
//!
//! Splits the screen into the tree panel, the tab strip, the grid panel and
//! the status line, and carves the grid panel into header, pinned rows, body
//! and footer. The app uses the same arithmetic to size grid viewports, so
//! what the state machine thinks is visible is exactly what gets drawn.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};

pub const MIN_TREE_WIDTH: u16 = 20;
pub const MAX_TREE_WIDTH: u16 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub tree: Rect,
    pub tabs: Rect,
    pub grid: Rect,
    pub status: Rect,
}

/// Regions inside the grid panel's border
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub header: Rect,
    /// Empty when nothing is pinned
    pub pinned: Rect,
    pub body: Rect,
    pub footer: Rect,
}

/// Calculate panel layout for the main screen
pub fn calculate_layout(area: Rect) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let tree_width = (area.width / 4).clamp(MIN_TREE_WIDTH, MAX_TREE_WIDTH);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(tree_width), Constraint::Min(1)])
        .split(rows[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(columns[1]);

    AppLayout {
        tree: columns[0],
        tabs: right[0],
        grid: right[1],
        status: rows[1],
    }
}

/// Inner area of a bordered panel
pub fn panel_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Split the inside of the grid panel. Pinned rows get one line each plus a
/// separator line, never more than half of the space.
pub fn grid_layout(inner: Rect, pinned: usize) -> GridLayout {
    let available = inner.height.saturating_sub(2);
    let pinned_height = if pinned == 0 {
        0
    } else {
        u16::try_from(pinned)
            .unwrap_or(u16::MAX)
            .saturating_add(1)
            .min(available / 2)
    };
    let body_height = available.saturating_sub(pinned_height);

    let header = Rect::new(inner.x, inner.y, inner.width, inner.height.min(1));
    let pinned = Rect::new(inner.x, header.bottom(), inner.width, pinned_height);
    let body = Rect::new(inner.x, pinned.bottom(), inner.width, body_height);
    let footer_y = body.bottom().min(inner.bottom().saturating_sub(1));
    let footer = Rect::new(inner.x, footer_y, inner.width, u16::from(inner.height >= 2));
    GridLayout {
        header,
        pinned,
        body,
        footer,
    }
}

/// Rows and width the grid body has on a screen of `screen` size
pub fn grid_viewport(screen: Rect, pinned: usize) -> (usize, u16) {
    let layout = calculate_layout(screen);
    let grid = grid_layout(panel_inner(layout.grid), pinned);
    (grid.body.height as usize, grid.body.width)
}

/// Rows available to the tree list
pub fn tree_viewport(screen: Rect) -> usize {
    panel_inner(calculate_layout(screen).tree).height as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_layout() {
        let area = Rect::new(0, 0, 100, 50);
        let layout = calculate_layout(area);

        assert_eq!(layout.tree.width, 25);
        assert_eq!(layout.tabs.height, 1);
        assert_eq!(layout.status.height, 1);
        assert_eq!(layout.grid.x, layout.tree.right());
        assert_eq!(layout.grid.height, 48);
    }

    #[test]
    fn test_tree_width_is_clamped() {
        assert_eq!(calculate_layout(Rect::new(0, 0, 40, 10)).tree.width, MIN_TREE_WIDTH);
        assert_eq!(calculate_layout(Rect::new(0, 0, 400, 10)).tree.width, MAX_TREE_WIDTH);
    }

    #[test]
    fn test_grid_layout_without_pins() {
        let grid = grid_layout(Rect::new(0, 0, 80, 20), 0);
        assert_eq!(grid.header.height, 1);
        assert_eq!(grid.pinned.height, 0);
        assert_eq!(grid.body.height, 18);
        assert_eq!(grid.footer.y, 19);
    }

    #[test]
    fn test_pins_take_space_from_body() {
        let grid = grid_layout(Rect::new(0, 0, 80, 20), 2);
        assert_eq!(grid.pinned.height, 3);
        assert_eq!(grid.body.height, 15);
        assert_eq!(grid.body.y, 4);
    }

    #[test]
    fn test_tiny_area_does_not_underflow() {
        let grid = grid_layout(Rect::new(0, 0, 10, 1), 5);
        assert_eq!(grid.body.height, 0);
        assert_eq!(grid.footer.height, 0);
    }
}
