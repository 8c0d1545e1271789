//! Application configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file named by
//! `HEBREW_APP_CONFIG`, then the `HEBREW_APP_DB` / `HEBREW_APP_USER` overrides.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "HEBREW_APP_CONFIG";
pub const DB_PATH_VAR: &str = "HEBREW_APP_DB";
pub const USER_VAR: &str = "HEBREW_APP_USER";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub username: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("hebrew.sqlite3"),
            username: "learner".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_VAR).filter(|p| !p.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(user) = lookup(USER_VAR).filter(|u| !u.is_empty()) {
            self.username = user;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "username": "miriam" }}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.username, "miriam");
        assert_eq!(config.database_path, PathBuf::from("hebrew.sqlite3"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(DB_PATH_VAR, "/tmp/other.db"), (USER_VAR, "")]
            .into_iter()
            .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        // empty values are ignored
        assert_eq!(config.username, "learner");
    }
}
