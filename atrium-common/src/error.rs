//! Error type shared across the atrium crates
//!
//! Store failures dominate here; everything the watch engine does ends in
//! SQLite. The remaining variants separate what the caller can act on
//! (bad input, missing object, broken config) from what they cannot.

use thiserror::Error;

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the watch engine and its record store
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (database file, config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or unparseable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The referenced object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied value failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Broken invariant the caller cannot recover from
    #[error("Internal error: {0}")]
    Internal(String),
}
