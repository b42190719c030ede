//! Error types for dbnav
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors with clear error chains.

use std::io;

/// Main error type for the dbnav application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Grid validation errors
    #[error("{0}")]
    Grid(#[from] GridError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Database operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
    /// Failed to establish connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected to a database
    #[error("Not connected to database")]
    NotConnected,

    /// Every pooled connection is busy
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Catalog introspection failed
    #[error("Schema loading failed: {0}")]
    SchemaLoadFailed(String),

    /// The task was cancelled before it produced a result
    #[error("Cancelled")]
    Cancelled,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

/// How a failure should be treated by the dispatch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No active connection or no capacity; surfaced, never retried
    Connectivity,
    /// The server rejected the request; surfaced verbatim
    Remote,
    /// Expected outcome of a cancel; silently dropped
    Cancelled,
}

impl DbError {
    /// Classify this error for routing
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::ConnectionFailed(_)
            | DbError::NotConnected
            | DbError::PoolExhausted
            | DbError::Timeout => ErrorKind::Connectivity,
            DbError::QueryFailed(_) | DbError::SchemaLoadFailed(_) => ErrorKind::Remote,
            DbError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Local validation failures raised by the grid viewport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Pinning another row would exceed the configured cap
    #[error("Pin limit reached ({max} rows)")]
    PinLimit { max: usize },

    /// The operation needs at least one loaded row
    #[error("No rows loaded")]
    NoRows,
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file not found
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Connection profile not found
    #[error("Connection profile '{0}' not found")]
    ProfileNotFound(String),

    /// Reading a config file failed
    #[error("Failed to read configuration: {0}")]
    Io(#[from] io::Error),
}

/// Specialized Result type for dbnav operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized Result type for grid operations
pub type GridResult<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DbError::NotConnected.kind(), ErrorKind::Connectivity);
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Connectivity);
        assert_eq!(
            DbError::QueryFailed("syntax error".into()).kind(),
            ErrorKind::Remote
        );
        assert_eq!(DbError::Timeout.kind(), ErrorKind::Connectivity);
        assert_eq!(DbError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_pin_limit_message() {
        let err = GridError::PinLimit { max: 3 };
        assert_eq!(err.to_string(), "Pin limit reached (3 rows)");
    }
}
