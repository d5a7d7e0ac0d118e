use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sn_core::{ArticleStorage, Error, Result};

pub mod backends;

pub use backends::*;

/// Database used when `sqlite` is chosen without an explicit url.
pub const DEFAULT_SQLITE_URL: &str = "sqlite:articles.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Sqlite,
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Memory
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(Error::Storage(format!(
                "Unknown storage backend: {} (expected memory or sqlite)",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Turn a configured database location into a sqlite connection url.
/// Bare paths are accepted; urls for other engines are rejected.
pub fn normalize_database_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(DEFAULT_SQLITE_URL.to_string());
    }
    if url.starts_with("sqlite:") {
        return Ok(url.to_string());
    }
    if url.contains("://") {
        return Err(Error::Storage(format!("Unsupported database url: {}", url)));
    }
    Ok(format!("sqlite:{}", url))
}

pub async fn create_storage(kind: StorageKind, database_url: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(InMemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let url = normalize_database_url(database_url.unwrap_or(DEFAULT_SQLITE_URL))?;
            Ok(Arc::new(SQLiteStorage::connect(&url).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            let _ = database_url;
            Err(Error::Storage("sqlite support was not compiled in".to_string()))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}
