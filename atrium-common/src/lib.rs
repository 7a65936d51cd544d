//! # Atrium Common Library
//!
//! Shared infrastructure for the Atrium forum-extension core:
//! - Error types
//! - Configuration loading
//! - Database initialization and schema
//! - Lock-retry helper for contended writes
//! - Time helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
