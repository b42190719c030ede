//! Data-driven keybinding configuration
//!
//! All keybindings are defined as data in `KeyMap::default()`, not as match arms
//! scattered across components. To add a new binding, add an entry to the
//! appropriate context in `KeyMap::default()` and handle the `KeyAction` in
//! `App::execute_key_action()`.
//!
//! Counted grid motions (`12j`, `gg`, `50G`) never reach the keymap: the grid's
//! motion state machine sees plain characters first.

use crate::app::PanelFocus;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// A key combination (code + modifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

impl From<KeyEvent> for KeyBind {
    fn from(event: KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Semantic key actions: what a key means, not which key it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Global
    Quit,
    CycleFocus,
    CycleFocusReverse,
    NewTab,
    CloseTab,
    NextTab,
    CancelQuery,
    OpenSqlPrompt,

    // Navigation (shared by tree and grid)
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,
    Home,
    End,
    Refresh,

    // Tree-specific
    Select,
    ToggleExpand,
    Expand,
    Collapse,
    FilterTree,

    // Grid-specific
    TogglePin,
    CycleSort,
    ToggleNullsFirst,
    LocalSearch,
    TableSearch,
    NextMatch,
    PrevMatch,

    // Prompt submit/dismiss; Esc elsewhere clears filters and searches
    Dismiss,
    Submit,
}

/// Keybinding configuration. Maps key combos to semantic actions per context.
pub struct KeyMap {
    /// Bindings that apply regardless of focus (checked first)
    global: HashMap<KeyBind, KeyAction>,
    /// Per-panel bindings (checked after global)
    panels: HashMap<PanelFocus, HashMap<KeyBind, KeyAction>>,
}

impl KeyMap {
    /// Resolve a key event to a semantic action.
    /// Checks global bindings first, then panel-specific bindings.
    pub fn resolve(&self, focus: PanelFocus, key: KeyEvent) -> Option<KeyAction> {
        let bind = KeyBind::from(key);
        if let Some(action) = self.global.get(&bind) {
            return Some(*action);
        }
        self.panels
            .get(&focus)
            .and_then(|m| m.get(&bind))
            .copied()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut global = HashMap::new();
        global.insert(KeyBind::ctrl('q'), KeyAction::Quit);
        global.insert(KeyBind::ctrl('c'), KeyAction::CancelQuery);
        global.insert(KeyBind::ctrl('t'), KeyAction::NewTab);
        global.insert(KeyBind::ctrl('w'), KeyAction::CloseTab);
        global.insert(KeyBind::plain(KeyCode::Tab), KeyAction::CycleFocus);
        global.insert(
            KeyBind::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            KeyAction::CycleFocusReverse,
        );

        let mut panels = HashMap::new();

        // ── Tree ─────────────────────────────────────────────────
        let mut tree = HashMap::new();
        insert_scroll_nav(&mut tree);
        insert_panel_common(&mut tree);
        tree.insert(KeyBind::plain(KeyCode::Enter), KeyAction::Select);
        tree.insert(KeyBind::plain(KeyCode::Char(' ')), KeyAction::ToggleExpand);
        tree.insert(KeyBind::plain(KeyCode::Char('l')), KeyAction::Expand);
        tree.insert(KeyBind::plain(KeyCode::Right), KeyAction::Expand);
        tree.insert(KeyBind::plain(KeyCode::Char('h')), KeyAction::Collapse);
        tree.insert(KeyBind::plain(KeyCode::Left), KeyAction::Collapse);
        tree.insert(KeyBind::plain(KeyCode::Char('/')), KeyAction::FilterTree);
        tree.insert(KeyBind::plain(KeyCode::Esc), KeyAction::Dismiss);
        panels.insert(PanelFocus::Tree, tree);

        // ── Grid ─────────────────────────────────────────────────
        let mut grid = HashMap::new();
        insert_vim_nav(&mut grid);
        insert_panel_common(&mut grid);
        grid.insert(KeyBind::ctrl('d'), KeyAction::HalfPageDown);
        grid.insert(KeyBind::ctrl('u'), KeyAction::HalfPageUp);
        grid.insert(KeyBind::ctrl('e'), KeyAction::ScrollDown);
        grid.insert(KeyBind::ctrl('y'), KeyAction::ScrollUp);
        grid.insert(KeyBind::plain(KeyCode::Char('p')), KeyAction::TogglePin);
        grid.insert(KeyBind::plain(KeyCode::Char('s')), KeyAction::CycleSort);
        grid.insert(
            KeyBind::new(KeyCode::Char('S'), KeyModifiers::SHIFT),
            KeyAction::ToggleNullsFirst,
        );
        grid.insert(KeyBind::plain(KeyCode::Char('/')), KeyAction::LocalSearch);
        grid.insert(
            KeyBind::new(KeyCode::Char('?'), KeyModifiers::SHIFT),
            KeyAction::TableSearch,
        );
        grid.insert(KeyBind::plain(KeyCode::Char('?')), KeyAction::TableSearch);
        grid.insert(KeyBind::plain(KeyCode::Char('n')), KeyAction::NextMatch);
        grid.insert(
            KeyBind::new(KeyCode::Char('N'), KeyModifiers::SHIFT),
            KeyAction::PrevMatch,
        );
        grid.insert(KeyBind::plain(KeyCode::Esc), KeyAction::Dismiss);
        panels.insert(PanelFocus::Grid, grid);

        // ── Prompt ───────────────────────────────────────────────
        let mut prompt = HashMap::new();
        prompt.insert(KeyBind::plain(KeyCode::Enter), KeyAction::Submit);
        prompt.insert(KeyBind::plain(KeyCode::Esc), KeyAction::Dismiss);
        panels.insert(PanelFocus::Prompt, prompt);

        Self { global, panels }
    }
}

/// Bindings shared by the browsing panels but not the prompt, where the
/// same characters are text
fn insert_panel_common(map: &mut HashMap<KeyBind, KeyAction>) {
    map.insert(KeyBind::plain(KeyCode::Char(':')), KeyAction::OpenSqlPrompt);
    map.insert(
        KeyBind::new(KeyCode::Char(':'), KeyModifiers::SHIFT),
        KeyAction::OpenSqlPrompt,
    );
    map.insert(KeyBind::plain(KeyCode::Char(']')), KeyAction::NextTab);
    map.insert(KeyBind::plain(KeyCode::Char('r')), KeyAction::Refresh);
}

/// Insert vim-style navigation bindings (arrows + hl + page + Home/End)
fn insert_vim_nav(map: &mut HashMap<KeyBind, KeyAction>) {
    insert_scroll_nav(map);

    map.insert(KeyBind::plain(KeyCode::Right), KeyAction::MoveRight);
    map.insert(KeyBind::plain(KeyCode::Char('l')), KeyAction::MoveRight);
    map.insert(KeyBind::plain(KeyCode::Left), KeyAction::MoveLeft);
    map.insert(KeyBind::plain(KeyCode::Char('h')), KeyAction::MoveLeft);
    map.insert(KeyBind::plain(KeyCode::Home), KeyAction::Home);
    map.insert(KeyBind::plain(KeyCode::End), KeyAction::End);
    map.insert(KeyBind::plain(KeyCode::Char('0')), KeyAction::Home);
    map.insert(KeyBind::plain(KeyCode::Char('$')), KeyAction::End);
    map.insert(
        KeyBind::new(KeyCode::Char('$'), KeyModifiers::SHIFT),
        KeyAction::End,
    );
}

/// Insert vertical navigation bindings (arrows + jk + page + g/G)
fn insert_scroll_nav(map: &mut HashMap<KeyBind, KeyAction>) {
    map.insert(KeyBind::plain(KeyCode::Down), KeyAction::MoveDown);
    map.insert(KeyBind::plain(KeyCode::Char('j')), KeyAction::MoveDown);
    map.insert(KeyBind::plain(KeyCode::Up), KeyAction::MoveUp);
    map.insert(KeyBind::plain(KeyCode::Char('k')), KeyAction::MoveUp);
    map.insert(KeyBind::plain(KeyCode::PageDown), KeyAction::PageDown);
    map.insert(KeyBind::plain(KeyCode::PageUp), KeyAction::PageUp);
    map.insert(KeyBind::plain(KeyCode::Char('g')), KeyAction::GoToTop);
    map.insert(
        KeyBind::new(KeyCode::Char('G'), KeyModifiers::SHIFT),
        KeyAction::GoToBottom,
    );
}
