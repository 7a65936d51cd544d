//! Configuration loading and database path resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the database file
pub const DB_PATH_ENV: &str = "ATRIUM_DB_PATH";

/// File-based configuration (TOML)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    /// Path to the SQLite database file
    pub database_path: Option<String>,
}

/// Resolved configuration for the Atrium core
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    /// Resolve the database path in priority order:
    /// 1. Explicit caller-supplied path (highest priority)
    /// 2. Environment variable
    /// 3. TOML config file (if one is supplied)
    /// 4. Compiled default (fallback)
    pub fn resolve(explicit: Option<&Path>, config_file: Option<&Path>) -> Result<Self> {
        // Priority 1: explicit path from the host application
        if let Some(path) = explicit {
            return Ok(Self {
                database_path: path.to_path_buf(),
            });
        }

        // Priority 2: environment variable
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.is_empty() {
                return Ok(Self {
                    database_path: PathBuf::from(path),
                });
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = config_file {
            let file = load_config_file(path)?;
            if let Some(db) = file.database_path {
                return Ok(Self {
                    database_path: PathBuf::from(db),
                });
            }
        }

        // Priority 4: compiled default
        Ok(Self {
            database_path: default_database_path(),
        })
    }
}

/// Parse a TOML config file
fn load_config_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Default database location next to the working directory
fn default_database_path() -> PathBuf {
    PathBuf::from("./atrium.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = Config::resolve(Some(Path::new("/tmp/explicit.db")), None).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/explicit.db"));
    }

    #[test]
    fn test_default_fallback() {
        // No explicit path, no config file; env var may be unset in test runs
        if std::env::var(DB_PATH_ENV).is_err() {
            let config = Config::resolve(None, None).unwrap();
            assert_eq!(config.database_path, PathBuf::from("./atrium.db"));
        }
    }

    #[test]
    fn test_config_file_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atrium.toml");
        std::fs::write(&path, "database_path = \"/srv/forum/atrium.db\"\n").unwrap();

        let config = Config::resolve(None, Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/forum/atrium.db"));
    }

    #[test]
    fn test_config_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "database_path = [not toml").unwrap();

        let result = Config::resolve(None, Some(&path));
        assert!(result.is_err());
    }
}
