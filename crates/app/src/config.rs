//! Application configuration from the environment

use std::path::PathBuf;

use bevy::prelude::*;
use folio_config::{BookConfig, ConfigError};

/// Directory of page images
pub const PAGES_ENV: &str = "FOLIO_PAGES";

/// Optional JSON file with book settings
pub const CONFIG_ENV: &str = "FOLIO_CONFIG";

/// Optional document id used in texture cache keys
pub const DOCUMENT_ENV: &str = "FOLIO_DOCUMENT";

const DEFAULT_PAGES_DIR: &str = "pages";

/// Application configuration resource
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct FolioConfig {
    pub pages_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub document_id: Option<String>,
}

impl FolioConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            pages_dir: non_empty(PAGES_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES_DIR)),
            config_path: non_empty(CONFIG_ENV).map(PathBuf::from),
            document_id: non_empty(DOCUMENT_ENV),
        }
    }

    /// Book settings from the config file when one is named, then env overrides
    pub fn load_book_config(&self) -> Result<BookConfig, ConfigError> {
        let config = match &self.config_path {
            Some(path) => BookConfig::from_file(path)?,
            None => BookConfig::default(),
        };
        Ok(config.with_env_overrides())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use folio_config::TurnFeel;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = FolioConfig::from_vars(vars(&[]));
        assert_eq!(config.pages_dir, PathBuf::from("pages"));
        assert!(config.config_path.is_none());
        assert!(config.document_id.is_none());
    }

    #[test]
    fn test_reads_env_and_ignores_blank() {
        let config = FolioConfig::from_vars(vars(&[
            (PAGES_ENV, "/srv/scans"),
            (CONFIG_ENV, "  "),
            (DOCUMENT_ENV, "atlas"),
        ]));
        assert_eq!(config.pages_dir, PathBuf::from("/srv/scans"));
        assert!(config.config_path.is_none());
        assert_eq!(config.document_id.as_deref(), Some("atlas"));
    }

    #[test]
    fn test_loads_config_file() {
        let path = std::env::temp_dir().join(format!("folio-app-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "feel": "soft", "page": { "segments": 12 } }"#).unwrap();
        let config = FolioConfig {
            pages_dir: PathBuf::from("pages"),
            config_path: Some(path.clone()),
            document_id: None,
        };
        let book = config.load_book_config().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(book.page.segments, 12);
        if std::env::var(folio_config::FEEL_ENV).is_err() {
            assert_eq!(book.feel, TurnFeel::Soft);
        }
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let config = FolioConfig {
            pages_dir: PathBuf::from("pages"),
            config_path: Some(PathBuf::from("/nonexistent/folio.json")),
            document_id: None,
        };
        assert!(matches!(config.load_book_config(), Err(ConfigError::Io(_))));
    }
}
