//! Data grid widget
//!
//! Draws a [`GridState`]: header, pinned rows, the visible row window and a
//! footer. Only cells inside the viewport are touched, and each one goes
//! through [`cell::prepare`] so the stored size of a value never matters.

use crate::grid::cell::{self, CellKind};
use crate::grid::columns::COLUMN_SEPARATOR;
use crate::grid::GridState;
use crate::ui::layout::grid_layout;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    grid: &GridState,
    error: Option<&str>,
    focused: bool,
    theme: &Theme,
) {
    if let Some(error) = error {
        let lines = vec![
            Line::from(Span::styled("Error", theme.grid_error_title)),
            Line::from(""),
            Line::from(Span::styled(error, theme.grid_error_text)),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
        return;
    }

    if grid.columns().is_empty() {
        let msg = if grid.is_paging() {
            "Loading…"
        } else {
            "Select a table in the tree, or press : to run a query."
        };
        frame.render_widget(Paragraph::new(msg).style(theme.grid_empty), area);
        return;
    }

    if area.height < 2 || area.width < 5 {
        return;
    }

    let layout = grid_layout(area, grid.pins().len());
    let columns = visible_columns(grid);

    frame.render_widget(
        Paragraph::new(header_line(grid, &columns, focused, theme)),
        layout.header,
    );

    if layout.pinned.height > 0 {
        let mut lines: Vec<Line> = grid
            .pins()
            .rows()
            .iter()
            .take(layout.pinned.height.saturating_sub(1) as usize)
            .map(|pin| {
                let cells = columns.iter().map(|&(col, width)| {
                    let raw = pin.values.get(col).map(String::as_str).unwrap_or_default();
                    (raw, width, theme.grid_pinned)
                });
                cells_line(cells, theme)
            })
            .collect();
        lines.push(Line::from(Span::styled(
            "─".repeat(layout.pinned.width as usize),
            theme.grid_footer,
        )));
        frame.render_widget(Paragraph::new(lines), layout.pinned);
    }

    let body: Vec<Line> = grid
        .rows()
        .iter()
        .enumerate()
        .skip(grid.top_row())
        .take(layout.body.height as usize)
        .map(|(row_idx, row)| {
            let is_cursor_row = row_idx == grid.selected_row();
            let base = if grid.pins().is_pinned(row_idx) {
                theme.grid_pinned
            } else if row_idx % 2 == 0 {
                theme.grid_row_even
            } else {
                theme.grid_row_odd
            };
            let cells = columns.iter().map(|&(col, width)| {
                let raw = row.get(col).map(String::as_str).unwrap_or_default();
                let style = if focused && is_cursor_row && col == grid.selected_col() {
                    theme.grid_selected_cell
                } else if grid.search().is_match(row_idx, col) {
                    theme.grid_match
                } else {
                    base
                };
                (raw, width, style)
            });
            let line = cells_line(cells, theme);
            if is_cursor_row {
                line.patch_style(theme.grid_selected_row)
            } else {
                line
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(body), layout.body);

    if layout.footer.height > 0 {
        frame.render_widget(
            Paragraph::new(footer_text(grid)).style(theme.grid_footer),
            layout.footer,
        );
    }
}

/// (column index, width) for every column inside the horizontal viewport
fn visible_columns(grid: &GridState) -> Vec<(usize, u16)> {
    let start = grid.left_col();
    let end = (start + grid.visible_cols().max(1)).min(grid.column_count());
    (start..end)
        .map(|c| (c, grid.col_widths().get(c).copied().unwrap_or(0)))
        .collect()
}

fn header_line(
    grid: &GridState,
    columns: &[(usize, u16)],
    focused: bool,
    theme: &Theme,
) -> Line<'static> {
    let sort = grid.sort();
    let mut spans = Vec::with_capacity(columns.len() * 2);
    for &(col, width) in columns {
        let name = &grid.columns()[col];
        let label = match sort {
            Some(spec) if spec.column == *name => spec.to_string(),
            _ => name.clone(),
        };
        let style = if focused && col == grid.selected_col() {
            theme.grid_header_selected
        } else {
            theme.grid_header
        };
        let prepared = cell::prepare(&label, width as usize);
        spans.push(Span::styled(pad(&prepared.text, width), style));
        spans.push(Span::raw(" ".repeat(COLUMN_SEPARATOR as usize)));
    }
    Line::from(spans)
}

fn cells_line<'a, I>(cells: I, theme: &Theme) -> Line<'static>
where
    I: Iterator<Item = (&'a str, u16, Style)>,
{
    let mut spans = Vec::new();
    for (raw, width, style) in cells {
        let prepared = cell::prepare(raw, width as usize);
        let style = match prepared.kind {
            CellKind::Null => style.patch(theme.grid_null),
            CellKind::Json => style.patch(theme.grid_json),
            CellKind::Text => style,
        };
        spans.push(Span::styled(pad(&prepared.text, width), style));
        spans.push(Span::raw(" ".repeat(COLUMN_SEPARATOR as usize)));
    }
    Line::from(spans)
}

/// Right-pad to `width` display columns
fn pad(text: &str, width: u16) -> String {
    let missing = (width as usize).saturating_sub(text.width());
    let mut s = String::with_capacity(text.len() + missing);
    s.push_str(text);
    s.extend(std::iter::repeat_n(' ', missing));
    s
}

/// `row 12/200 of 15000 | pins 1/5 | name↓ | match 2/7 | loading…`
pub fn footer_text(grid: &GridState) -> String {
    let mut parts = Vec::new();
    let position = if grid.row_count() == 0 {
        0
    } else {
        grid.selected_row() + 1
    };
    parts.push(format!(
        "row {}/{} of {}",
        position,
        grid.row_count(),
        grid.total_rows()
    ));
    if !grid.pins().is_empty() {
        parts.push(format!("pins {}/{}", grid.pins().len(), grid.pins().max()));
    }
    if let Some(sort) = grid.sort() {
        parts.push(sort.to_string());
    }
    if let Some(active) = grid.search().active_index() {
        parts.push(format!(
            "match {}/{}",
            active + 1,
            grid.search().matches().len()
        ));
    }
    if grid.motion().is_pending() {
        parts.push(grid.motion().pending_display());
    }
    if grid.is_paging() || grid.is_prefetching() {
        parts.push("loading…".to_string());
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSettings;
    use crate::db::PageData;
    use crate::grid::{GridTarget, MotionState};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn grid(rows: usize, total: usize) -> GridState {
        let mut grid = GridState::new(
            GridTarget::Table {
                database: "app".into(),
                schema: "public".into(),
                table: "users".into(),
            },
            &GridSettings::default(),
            MotionState::new(Duration::from_millis(1500)),
        );
        grid.apply_page(
            0,
            PageData {
                columns: vec!["id".into(), "payload".into()],
                rows: (0..rows)
                    .map(|i| {
                        let payload = if i == 1 {
                            "NULL".to_string()
                        } else {
                            format!("{{\"k\": \"{}\"}}", "x".repeat(1_000_000))
                        };
                        vec![i.to_string(), payload]
                    })
                    .collect(),
                total_rows: total,
            },
        );
        grid.set_viewport(5, 60);
        grid
    }

    #[test]
    fn test_pad_uses_display_width() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("日本", 5), "日本 ");
        assert_eq!(pad("toolong", 3), "toolong");
    }

    #[test]
    fn test_footer_text() {
        let mut g = grid(3, 100);
        g.move_selection(1);
        g.toggle_pin().unwrap();
        assert_eq!(footer_text(&g), "row 2/3 of 100 | pins 1/5");
    }

    #[test]
    fn test_render_huge_cells() {
        let g = grid(3, 3);
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal
            .draw(|f| render_grid(f, f.area(), &g, None, true, &Theme::default()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let header: String = (0..10).map(|x| buffer[(x, 0)].symbol().to_string()).collect();
        assert!(header.starts_with("id"));
        let null_row: String = (0..60).map(|x| buffer[(x, 2)].symbol().to_string()).collect();
        assert!(null_row.contains("NULL"));
    }

    #[test]
    fn test_render_error() {
        let g = grid(0, 0);
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal
            .draw(|f| {
                let error = Some("relation does not exist");
                render_grid(f, f.area(), &g, error, false, &Theme::default())
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let first: String = (0..5).map(|x| buffer[(x, 0)].symbol().to_string()).collect();
        assert_eq!(first, "Error");
    }
}
