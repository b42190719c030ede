//! User settings and preferences
//!
//! Manages application settings stored in ~/.dbnav/config.toml

use crate::config::ConnectionConfig;
use crate::error::ConfigResult;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub grid: GridSettings,

    #[serde(default)]
    pub tree: TreeSettings,

    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub db: DbSettings,

    #[serde(default)]
    pub log: LogSettings,
}

/// Data grid paging, sizing and pinning limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Rows requested per page
    pub page_size: usize,
    /// Prefetch once fewer than this many loaded rows remain below the cursor (0 disables)
    pub prefetch_threshold: usize,
    pub max_pinned_rows: usize,
    pub min_column_width: u16,
    pub max_column_width: u16,
    /// Rows inspected when sizing columns
    pub width_sample_rows: usize,
    /// Bytes of each sampled cell inspected when sizing columns
    pub width_sample_bytes: usize,
    /// Distance from the loaded boundary that counts as "near the end"
    pub near_end_margin: usize,
    pub row_cache_capacity: usize,
    /// Upper bound on rows fetched by a single jump past the loaded window
    pub max_jump_rows: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            page_size: 200,
            prefetch_threshold: 50,
            max_pinned_rows: 5,
            min_column_width: 4,
            max_column_width: 40,
            width_sample_rows: 100,
            width_sample_bytes: 256,
            near_end_margin: 10,
            row_cache_capacity: 2000,
            max_jump_rows: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Include pg_catalog / information_schema in schema lists
    pub show_system_schemas: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub max_tabs: usize,
    /// How long a pending `g` or count prefix stays armed
    pub motion_timeout_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            max_tabs: 5,
            motion_timeout_ms: 1500,
        }
    }
}

/// Server sessions opened by a connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    /// Databases kept open at once; ad-hoc statements get one more session
    pub max_connections: usize,
    pub connect_timeout_secs: u64,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            max_connections: 8,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: LogLevel,
    /// Log file; logging is disabled when unset
    pub file: Option<PathBuf>,
}

/// Load settings from ~/.dbnav/config.toml, falling back to defaults when absent
pub fn load_settings() -> ConfigResult<Settings> {
    let path = ConnectionConfig::config_dir()?.join("config.toml");
    load_settings_from(&path)
}

/// Load settings from an explicit path
pub fn load_settings_from(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}
