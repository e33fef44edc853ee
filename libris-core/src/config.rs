use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Environment variable pointing at an alternate config file
pub const CONFIG_ENV: &str = "LIBRIS_CONFIG";

const DEFAULT_DATABASE_URL: &str = "sqlite://libris.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Centralized configuration for the libris service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibrisConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LibrisConfig {
    /// Load config from `$LIBRIS_CONFIG` or ~/.libris/config.toml, then apply
    /// environment overrides.
    ///
    /// A missing file is not an error: every field has a default.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from an explicit path without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::config_parse(path, e))
    }

    /// Config file path: `$LIBRIS_CONFIG` or ~/.libris/config.toml
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".libris/config.toml")
    }

    /// Apply `DATABASE_URL` and `LIBRIS_BIND` overrides.
    ///
    /// The lookup is injected so tests don't have to mutate process env.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = url;
        }

        if let Some(bind) = lookup("LIBRIS_BIND").filter(|v| !v.is_empty()) {
            self.server.bind = bind
                .parse()
                .map_err(|_| CoreError::invalid_value("LIBRIS_BIND", bind))?;
        }

        Ok(())
    }

    /// Write config to `path`, refusing to clobber an existing file unless `force`.
    pub fn save_to(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(CoreError::ConfigExists {
                path: path.to_path_buf(),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LibrisConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, LibrisConfig::default());
        assert_eq!(config.database.url, "sqlite://libris.db");
        assert_eq!(config.server.bind.port(), 8000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[database]\nurl = \"sqlite://other.db\"\n").unwrap();

        let config = LibrisConfig::load_from(&path).unwrap();
        assert_eq!(config.database.url, "sqlite://other.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nbind = ").unwrap();

        let err = LibrisConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite::memory:"),
            ("LIBRIS_BIND", "0.0.0.0:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = LibrisConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.bind.port(), 9000);
    }

    #[test]
    fn bad_bind_override_rejected() {
        let mut config = LibrisConfig::default();
        let err = config
            .apply_overrides(|k| (k == "LIBRIS_BIND").then(|| "nonsense".to_string()))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue { key: "LIBRIS_BIND", .. }));
    }

    #[test]
    fn save_round_trip_and_no_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = LibrisConfig::default();
        config.server.cors_permissive = true;
        config.save_to(&path, false).unwrap();

        assert_eq!(LibrisConfig::load_from(&path).unwrap(), config);
        assert!(matches!(
            config.save_to(&path, false).unwrap_err(),
            CoreError::ConfigExists { .. }
        ));
        config.save_to(&path, true).unwrap();
    }
}
