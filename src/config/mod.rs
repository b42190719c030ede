//! Configuration management
//!
//! Handles loading connection profiles and user settings.

pub mod connections;
pub mod settings;

pub use connections::{ConnectionConfig, SslMode, find_connection, resolve_target};
pub use settings::{DbSettings, GridSettings, Settings, load_settings};
