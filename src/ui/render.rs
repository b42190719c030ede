//! Top-level render function
//!
//! Orchestrates rendering of all panels using the layout module.

use crate::app::{App, PanelFocus, StatusLevel};
use crate::ui::grid::render_grid;
use crate::ui::layout::calculate_layout;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Render the entire application
pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let layout = calculate_layout(frame.area());

    // Tree browser
    let tree_block = Block::default()
        .borders(Borders::ALL)
        .title(" Schema ")
        .border_style(theme.border_style(app.focus == PanelFocus::Tree));
    let tree_inner = tree_block.inner(layout.tree);
    frame.render_widget(tree_block, layout.tree);
    app.tree_browser.render(
        frame,
        tree_inner,
        app.focus == PanelFocus::Tree,
        &app.tree,
        app.loading_node(),
        app.matcher(),
        theme,
    );

    render_tabs(frame, layout.tabs, app, theme);

    // Grid
    let tab = app.tab();
    let grid_focused = app.focus == PanelFocus::Grid;
    let title = if tab.query_running {
        format!(" {} (running) ", tab.title())
    } else {
        format!(" {} ", tab.title())
    };
    let grid_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(theme.border_style(grid_focused));
    let grid_inner = grid_block.inner(layout.grid);
    frame.render_widget(grid_block, layout.grid);
    render_grid(
        frame,
        grid_inner,
        &tab.grid,
        tab.error.as_deref(),
        grid_focused,
        theme,
    );

    // Prompt / status bar
    render_status(frame, layout.status, app, theme);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut spans = Vec::with_capacity(app.tabs.len() * 2);
    for (i, tab) in app.tabs.iter().enumerate() {
        let style = if i == app.active_tab {
            theme.tab_active
        } else {
            theme.tab_inactive
        };
        spans.push(Span::styled(format!(" {}:{} ", i + 1, tab.title()), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    if app.prompt.is_active() {
        app.prompt.render(frame, area, theme);
        return;
    }

    let conn_info = match &app.connection_name {
        Some(name) => format!("[{}] ", name),
        None => "[disconnected] ".to_string(),
    };

    if let Some(status) = &app.status_message {
        let style = match status.level {
            StatusLevel::Info => theme.status_info,
            StatusLevel::Success => theme.status_success,
            StatusLevel::Warning => theme.status_warning,
            StatusLevel::Error => theme.status_error,
        };
        let text = format!("{}{}", conn_info, status.message);
        frame.render_widget(Paragraph::new(text).style(style), area);
        return;
    }

    let location = app.breadcrumb().unwrap_or_default();
    let line = Line::from(vec![
        Span::raw(conn_info),
        Span::raw(location),
        Span::styled(
            "  : sql  / filter  Tab focus  Ctrl+Q quit",
            theme.status_hint,
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dispatch::AppEvent;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_render_empty_app() {
        let mut app = App::new(&Settings::default());
        app.handle_event(AppEvent::Resize(100, 30)).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Schema"));
        assert!(text.contains("1:new"));
        assert!(text.contains("[disconnected]"));
    }

    #[test]
    fn test_render_status_message() {
        let mut app = App::new(&Settings::default());
        app.connection_name = Some("local".to_string());
        app.set_status("Query failed: boom".to_string(), StatusLevel::Error);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(screen_text(&terminal).contains("[local] Query failed: boom"));
    }
}
