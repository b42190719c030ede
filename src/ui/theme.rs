//! UI theme and styling
//!
//! Defines colors, styles, and visual appearance for all UI components.

use ratatui::style::{Color, Modifier, Style};

/// Application theme
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_focused: Style,
    pub border_unfocused: Style,

    // Tree browser
    pub tree_database: Style,
    pub tree_schema: Style,
    pub tree_relation: Style,
    pub tree_leaf: Style,
    pub tree_meta: Style,
    pub tree_selected: Style,
    pub tree_match: Style,

    // Tabs
    pub tab_active: Style,
    pub tab_inactive: Style,

    // Data grid
    pub grid_header: Style,
    pub grid_header_selected: Style,
    pub grid_row_even: Style,
    pub grid_row_odd: Style,
    pub grid_selected_row: Style,
    pub grid_selected_cell: Style,
    pub grid_null: Style,
    pub grid_json: Style,
    pub grid_match: Style,
    pub grid_pinned: Style,
    pub grid_footer: Style,
    pub grid_empty: Style,
    pub grid_error_title: Style,
    pub grid_error_text: Style,

    // Prompt
    pub prompt_prefix: Style,
    pub prompt_input: Style,

    // Status messages
    pub status_success: Style,
    pub status_error: Style,
    pub status_info: Style,
    pub status_warning: Style,
    pub status_hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Borders
            border_focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            border_unfocused: Style::default().fg(Color::DarkGray),

            // Tree browser
            tree_database: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            tree_schema: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            tree_relation: Style::default().fg(Color::Green),
            tree_leaf: Style::default().fg(Color::Gray),
            tree_meta: Style::default().fg(Color::DarkGray),
            tree_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            tree_match: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED),

            // Tabs
            tab_active: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
            tab_inactive: Style::default().fg(Color::Gray),

            // Data grid
            grid_header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            grid_header_selected: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            grid_row_even: Style::default().fg(Color::White),
            grid_row_odd: Style::default().fg(Color::Gray),
            grid_selected_row: Style::default().bg(Color::Rgb(40, 40, 60)),
            grid_selected_cell: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow),
            grid_null: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            grid_json: Style::default().fg(Color::LightBlue),
            grid_match: Style::default()
                .fg(Color::Black)
                .bg(Color::LightMagenta),
            grid_pinned: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            grid_footer: Style::default().fg(Color::DarkGray),
            grid_empty: Style::default().fg(Color::DarkGray),
            grid_error_title: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            grid_error_text: Style::default().fg(Color::Red),

            // Prompt
            prompt_prefix: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            prompt_input: Style::default().fg(Color::White),

            // Status messages
            status_success: Style::default().fg(Color::Green),
            status_error: Style::default().fg(Color::Red),
            status_info: Style::default().fg(Color::Blue),
            status_warning: Style::default().fg(Color::Yellow),
            status_hint: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    /// Get border style based on focus
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            self.border_focused
        } else {
            self.border_unfocused
        }
    }
}
