use crate::persistence::{EntityStore, MemoryStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const ENV_HTTP_ADDR: &str = "CRITTER_HTTP_ADDR";
pub const ENV_DB: &str = "CRITTER_DB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid listen address '{0}'")]
    InvalidAddr(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
}

impl StoreConfig {
    /// `:memory:` (or `memory`) selects the in-process store, anything else is a SQLite file.
    pub fn from_db_arg(value: &str) -> Self {
        match value.trim() {
            ":memory:" | "memory" | "" => StoreConfig::Memory,
            path => StoreConfig::Sqlite {
                path: PathBuf::from(path),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CritterConfig {
    pub http_addr: SocketAddr,
    pub store: StoreConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for CritterConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store: StoreConfig::Memory,
            log_filter: None,
        }
    }
}

impl CritterConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Applies `CRITTER_HTTP_ADDR` and `CRITTER_DB` as looked up by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.http_addr = parse_addr(&addr)?;
        }
        if let Some(db) = lookup(ENV_DB) {
            self.store = StoreConfig::from_db_arg(&db);
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn open_store(&self) -> StoreResult<Arc<dyn EntityStore>> {
        match &self.store {
            StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            #[cfg(feature = "sqlite")]
            StoreConfig::Sqlite { path } => Ok(Arc::new(crate::persistence::SqliteStore::new(path)?)),
            #[cfg(not(feature = "sqlite"))]
            StoreConfig::Sqlite { path } => Err(crate::persistence::StoreError::unavailable(format!(
                "cannot open {path:?}: built without the `sqlite` feature"
            ))),
        }
    }
}

pub fn parse_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddr(value.to_string()))
}
