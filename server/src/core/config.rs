use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filters::CompilerConfig;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_MAX_PAGE_SIZE, DEFAULT_NULL_SAFE_FUNCTION,
    SQLITE_MAX_CONNECTIONS,
};

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Database configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
    pub max_connections: Option<u32>,
}

/// Query compilation section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub null_safe_function: Option<String>,
    pub max_page_size: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub data_dir: Option<String>,
    pub database: Option<DatabaseFileConfig>,
    pub query: Option<QueryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if other.data_dir.is_some() {
            tracing::trace!(data_dir = ?other.data_dir, "Merging data_dir");
            self.data_dir = other.data_dir;
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
            if database.max_connections.is_some() {
                current.max_connections = database.max_connections;
            }
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.null_safe_function.is_some() {
                tracing::trace!(
                    function = ?query.null_safe_function,
                    "Merging query.null_safe_function"
                );
                current.null_safe_function = query.null_safe_function;
            }
            if query.max_page_size.is_some() {
                current.max_page_size = query.max_page_size;
            }
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Explicit database file; defaults to the data directory's sqlite folder
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: SQLITE_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub null_safe_function: String,
    pub max_page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            null_safe_function: DEFAULT_NULL_SAFE_FUNCTION.to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl QueryConfig {
    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            null_safe_function: self.null_safe_function.clone(),
            max_page_size: self.max_page_size,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub database: DatabaseConfig,
    pub query: QueryConfig,
}

impl AppConfig {
    /// Load configuration with precedence (lowest to highest):
    /// 1. Built-in defaults
    /// 2. Profile directory config (~/.userquery/userquery.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(cli, file_config);
        config.validate()?;
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_database = file_config.database.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();

        let data_dir = cli
            .data_dir
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_config.data_dir.as_deref().map(expand_path));

        let db_path = cli
            .db
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_database.path.as_deref().map(expand_path));

        let null_safe_function = cli
            .null_safe_function
            .clone()
            .or(file_query.null_safe_function)
            .unwrap_or_else(|| DEFAULT_NULL_SAFE_FUNCTION.to_string());

        let max_page_size = cli
            .max_page_size
            .or(file_query.max_page_size)
            .unwrap_or(DEFAULT_MAX_PAGE_SIZE);

        Self {
            data_dir,
            database: DatabaseConfig {
                path: db_path,
                max_connections: file_database
                    .max_connections
                    .unwrap_or(SQLITE_MAX_CONNECTIONS),
            },
            query: QueryConfig {
                null_safe_function,
                max_page_size,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        // The function name is written into SQL text
        if !is_sql_identifier(&self.query.null_safe_function) {
            anyhow::bail!(
                "Configuration error: query.null_safe_function must be a plain SQL function name, got {:?}",
                self.query.null_safe_function
            );
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Configuration error: database.max_connections must be greater than 0");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.userquery/userquery.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "data_dir": "/var/lib/userquery",
            "database": { "path": "/tmp/users.db", "max_connections": 2 },
            "query": { "null_safe_function": "COALESCE", "max_page_size": 100 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.data_dir.as_deref(), Some("/var/lib/userquery"));
        let database = config.database.as_ref().unwrap();
        assert_eq!(database.path.as_deref(), Some("/tmp/users.db"));
        assert_eq!(database.max_connections, Some(2));
        let query = config.query.as_ref().unwrap();
        assert_eq!(query.null_safe_function.as_deref(), Some("COALESCE"));
        assert_eq!(query.max_page_size, Some(100));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.database.is_none());
        assert!(config.query.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "query": { "max_page_size": 10 }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.query.as_ref().unwrap().max_page_size, Some(10));
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            query: Some(QueryFileConfig {
                null_safe_function: Some("IFNULL".to_string()),
                max_page_size: Some(100),
            }),
            ..FileConfig::default()
        };
        let overlay = FileConfig {
            query: Some(QueryFileConfig {
                null_safe_function: None,
                max_page_size: Some(20),
            }),
            database: Some(DatabaseFileConfig {
                path: Some("/tmp/overlay.db".to_string()),
                max_connections: None,
            }),
            ..FileConfig::default()
        };

        base.merge(overlay);

        let query = base.query.unwrap();
        assert_eq!(query.null_safe_function.as_deref(), Some("IFNULL"));
        assert_eq!(query.max_page_size, Some(20));
        assert_eq!(
            base.database.unwrap().path.as_deref(),
            Some("/tmp/overlay.db")
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), FileConfig::default());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.query.compiler_config(), CompilerConfig::default());
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file = FileConfig {
            query: Some(QueryFileConfig {
                null_safe_function: Some("COALESCE".to_string()),
                max_page_size: Some(100),
            }),
            ..FileConfig::default()
        };
        let cli = CliConfig {
            max_page_size: Some(25),
            db: Some(PathBuf::from("/tmp/cli.db")),
            ..CliConfig::default()
        };

        let config = AppConfig::resolve(&cli, file);
        assert_eq!(config.query.null_safe_function, "COALESCE");
        assert_eq!(config.query.max_page_size, 25);
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/cli.db")));
    }

    #[test]
    fn test_load_from_cli_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{ "query": { "max_page_size": 42 } }"#).unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..CliConfig::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.query.max_page_size, 42);
    }

    #[test]
    fn test_load_missing_config_path() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/userquery.json")),
            ..CliConfig::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_validation_rejects_non_identifier_function() {
        let config = AppConfig {
            query: QueryConfig {
                null_safe_function: "IFNULL(1);--".to_string(),
                ..QueryConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_connections() {
        let config = AppConfig {
            database: DatabaseConfig {
                path: None,
                max_connections: 0,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_sql_identifier() {
        assert!(is_sql_identifier("IFNULL"));
        assert!(is_sql_identifier("coalesce"));
        assert!(is_sql_identifier("_f1"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("1abc"));
        assert!(!is_sql_identifier("if null"));
    }
}
