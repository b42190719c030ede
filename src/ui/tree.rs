//! Database tree browser widget
//!
//! Displays the navigation tree as an indented list. The visible list is a
//! projection of the [`TreeModel`] that must be rebuilt whenever expansion,
//! children or the filter change; the selection follows its node across
//! rebuilds and is re-clamped when that node is no longer shown.

use crate::fuzzy::FuzzyMatcher;
use crate::tree::{NodeIndex, NodeKind, NodeMeta, TreeModel, TreeNode};
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub struct TreeBrowser {
    /// Displayed nodes, top to bottom
    visible: Vec<NodeIndex>,
    /// Currently selected row in `visible`
    selected: usize,
    scroll_offset: usize,
    /// Active filter query; empty shows the plain expanded tree
    filter: String,
}

impl TreeBrowser {
    pub fn new() -> Self {
        Self {
            visible: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            filter: String::new(),
        }
    }

    /// Rebuild the visible list, keeping the selected node when it survives
    pub fn refresh(&mut self, tree: &TreeModel, matcher: &FuzzyMatcher) {
        let previous = self.selected_node();
        self.visible = tree.filter_view(&self.filter, matcher);
        if let Some(pos) = previous.and_then(|p| self.visible.iter().position(|&i| i == p)) {
            self.selected = pos;
        }
        self.selected = self.selected.min(self.visible.len().saturating_sub(1));
    }

    pub fn visible(&self) -> &[NodeIndex] {
        &self.visible
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_node(&self) -> Option<NodeIndex> {
        self.visible.get(self.selected).copied()
    }

    /// Select `node` if it is displayed
    pub fn select_node(&mut self, node: NodeIndex) -> bool {
        match self.visible.iter().position(|&i| i == node) {
            Some(pos) => {
                self.selected = pos;
                true
            }
            None => false,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_filtered(&self) -> bool {
        !self.filter.is_empty()
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, height: usize) {
        self.selected = self.selected.saturating_sub(height.max(1));
    }

    pub fn page_down(&mut self, height: usize) {
        self.selected = (self.selected + height.max(1)).min(self.visible.len().saturating_sub(1));
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    /// Slide the scroll offset so the selection is inside `height` rows
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        focused: bool,
        tree: &TreeModel,
        loading: Option<&str>,
        matcher: &FuzzyMatcher,
        theme: &Theme,
    ) {
        if self.visible.is_empty() {
            let msg = if self.is_filtered() {
                "No matches"
            } else {
                "Loading…"
            };
            frame.render_widget(Paragraph::new(msg).style(theme.tree_meta), area);
            return;
        }

        let height = area.height as usize;
        let offset = if self.selected >= self.scroll_offset + height {
            self.selected + 1 - height
        } else {
            self.scroll_offset.min(self.selected)
        };

        let lines: Vec<Line> = self
            .visible
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .filter_map(|(row, &index)| {
                let node = tree.node(index)?;
                let depth = tree.depth(index).saturating_sub(1);
                let is_loading = loading == Some(node.id());
                Some(self.render_line(
                    node,
                    depth,
                    is_loading,
                    focused && row == self.selected,
                    matcher,
                    theme,
                ))
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_line<'a>(
        &self,
        node: &'a TreeNode,
        depth: usize,
        loading: bool,
        selected: bool,
        matcher: &FuzzyMatcher,
        theme: &Theme,
    ) -> Line<'a> {
        let indicator = if loading {
            "… "
        } else if !node.can_expand() {
            "  "
        } else if node.is_expanded() {
            "▼ "
        } else {
            "▶ "
        };

        let base = match node.kind() {
            NodeKind::Database => theme.tree_database,
            NodeKind::Schema => theme.tree_schema,
            kind if kind.is_relation() => theme.tree_relation,
            _ => theme.tree_leaf,
        };

        let mut spans = vec![Span::raw("  ".repeat(depth)), Span::styled(indicator, base)];

        let hits = if self.is_filtered() {
            matcher
                .match_indices(&self.filter, node.label())
                .map(|m| m.indices)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        if hits.is_empty() {
            spans.push(Span::styled(node.label(), base));
        } else {
            for (i, c) in node.label().chars().enumerate() {
                let style = if hits.contains(&i) {
                    theme.tree_match
                } else {
                    base
                };
                spans.push(Span::styled(c.to_string(), style));
            }
        }

        if let Some(detail) = meta_detail(node.meta()) {
            spans.push(Span::styled(format!(" {}", detail), theme.tree_meta));
        }

        let line = Line::from(spans);
        if selected {
            line.style(theme.tree_selected)
        } else {
            line
        }
    }
}

impl Default for TreeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

/// Short dimmed suffix shown after a label
fn meta_detail(meta: &NodeMeta) -> Option<String> {
    match meta {
        NodeMeta::Database { active: true } => Some("●".to_string()),
        NodeMeta::Column {
            data_type,
            nullable,
            primary_key,
        } => {
            let mut s = data_type.clone();
            if *primary_key {
                s.push_str(" pk");
            } else if !*nullable {
                s.push_str(" not null");
            }
            Some(s)
        }
        NodeMeta::Relation {
            row_estimate: Some(n),
        } if *n >= 0 => Some(format!("~{}", n)),
        NodeMeta::Routine { arguments, .. } => Some(format!("({})", arguments)),
        NodeMeta::Index { primary: true, .. } => Some("primary".to_string()),
        NodeMeta::Index { unique: true, .. } => Some("unique".to_string()),
        NodeMeta::Extension { version } => Some(version.clone()),
        _ => None,
    }
}
