//! Error types for harmonia-player
//!
//! Module-specific error types using thiserror for clear error propagation.

use crate::catalog::ScanError;
use thiserror::Error;

/// Result type for harmonia-player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for harmonia-player
#[derive(Error, Debug)]
pub enum Error {
    /// Shared error from harmonia-common
    #[error(transparent)]
    Common(#[from] harmonia_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Catalog scan errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
