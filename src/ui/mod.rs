//! Terminal UI components
//!
//! All UI widgets and rendering logic using ratatui. Widgets only read
//! application state; every change goes through [`crate::app::App`].

pub mod grid;
pub mod layout;
pub mod prompt;
pub mod render;
pub mod theme;
pub mod tree;
