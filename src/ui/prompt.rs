//! Single-line prompt
//!
//! One input line shared by SQL entry, grid searches and the tree filter.
//! The mode decides the leading character and what Enter does.

use crate::ui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// `:` run a statement
    Sql,
    /// `/` search the loaded rows
    LocalSearch,
    /// `?` search the whole table remotely
    TableSearch,
    /// `/` in the tree, narrows it as you type
    TreeFilter,
}

impl PromptMode {
    pub fn prefix(self) -> char {
        match self {
            PromptMode::Sql => ':',
            PromptMode::LocalSearch | PromptMode::TreeFilter => '/',
            PromptMode::TableSearch => '?',
        }
    }
}

pub struct Prompt {
    input: String,
    /// Cursor position in chars
    cursor: usize,
    mode: Option<PromptMode>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            mode: None,
        }
    }

    pub fn activate(&mut self, mode: PromptMode) {
        self.mode = Some(mode);
        self.input.clear();
        self.cursor = 0;
    }

    /// Open with text already typed, cursor at the end
    pub fn activate_with(&mut self, mode: PromptMode, text: &str) {
        self.activate(mode);
        self.input.push_str(text);
        self.cursor = text.chars().count();
    }

    pub fn deactivate(&mut self) {
        self.mode = None;
        self.input.clear();
        self.cursor = 0;
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<PromptMode> {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn insert_char(&mut self, c: char) {
        let byte = self.byte_at(self.cursor);
        self.input.insert(byte, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            let byte = self.byte_at(self.cursor - 1);
            self.input.remove(byte);
            self.cursor -= 1;
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    /// Edit keys. Returns true when the text changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(c);
                true
            }
            KeyCode::Backspace => {
                let before = self.input.len();
                self.delete_char();
                before != self.input.len()
            }
            KeyCode::Left => {
                self.move_left();
                false
            }
            KeyCode::Right => {
                self.move_right();
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = self.input.chars().count();
                false
            }
            _ => false,
        }
    }

    fn byte_at(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map_or(self.input.len(), |(b, _)| b)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(mode) = self.mode else {
            return;
        };
        let line = Line::from(vec![
            Span::styled(mode.prefix().to_string(), theme.prompt_prefix),
            Span::styled(self.input.as_str(), theme.prompt_input),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let before: String = self.input.chars().take(self.cursor).collect();
        let x = area.x + 1 + before.width() as u16;
        if x < area.x + area.width {
            frame.set_cursor_position(Position::new(x, area.y));
        }
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_prompt_new() {
        let prompt = Prompt::new();
        assert!(!prompt.is_active());
        assert_eq!(prompt.input(), "");
    }

    #[test]
    fn test_activate_deactivate() {
        let mut prompt = Prompt::new();
        prompt.activate(PromptMode::Sql);
        assert_eq!(prompt.mode(), Some(PromptMode::Sql));
        prompt.deactivate();
        assert!(!prompt.is_active());
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut prompt = Prompt::new();
        prompt.activate(PromptMode::LocalSearch);
        for c in "abc".chars() {
            assert!(prompt.handle_key(key(KeyCode::Char(c))));
        }
        assert!(prompt.handle_key(key(KeyCode::Backspace)));
        assert_eq!(prompt.input(), "ab");
        assert!(!prompt.handle_key(key(KeyCode::Left)));
        prompt.insert_char('x');
        assert_eq!(prompt.input(), "axb");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut prompt = Prompt::new();
        prompt.activate_with(PromptMode::Sql, "héllo");
        prompt.move_left();
        prompt.move_left();
        prompt.move_left();
        prompt.delete_char();
        assert_eq!(prompt.input(), "hllo");
    }

    #[test]
    fn test_backspace_on_empty_reports_no_change() {
        let mut prompt = Prompt::new();
        prompt.activate(PromptMode::TreeFilter);
        assert!(!prompt.handle_key(key(KeyCode::Backspace)));
    }
}
