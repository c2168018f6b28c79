use std::env;
use std::path::{Path, PathBuf};

use crate::persistence::{JsonFileStore, KeyValueStore, MemoryStore, StorageResult};
#[cfg(feature = "sqlite")]
use crate::persistence::SqliteStore;

pub const STORE_ENV: &str = "SCHOOL_PLANNER_STORE";
pub const HTTP_ADDR_ENV: &str = "SCHOOL_PLANNER_HTTP_ADDR";
pub const DEFAULT_STORE_PATH: &str = "school-planner-store.json";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";
pub const MEMORY_STORE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    JsonFile(PathBuf),
    #[cfg(feature = "sqlite")]
    Sqlite(PathBuf),
}

impl StoreLocation {
    /// `:memory:` selects the in-memory store, `.db`/`.sqlite`/`.sqlite3`
    /// selects SQLite when compiled in, anything else a JSON file.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value == MEMORY_STORE {
            return StoreLocation::Memory;
        }
        let path = PathBuf::from(value);
        #[cfg(feature = "sqlite")]
        if is_sqlite_path(&path) {
            return StoreLocation::Sqlite(path);
        }
        StoreLocation::JsonFile(path)
    }

    pub fn open(&self) -> StorageResult<Box<dyn KeyValueStore>> {
        Ok(match self {
            StoreLocation::Memory => Box::new(MemoryStore::new()),
            StoreLocation::JsonFile(path) => Box::new(JsonFileStore::open(path)?),
            #[cfg(feature = "sqlite")]
            StoreLocation::Sqlite(path) => Box::new(SqliteStore::new(path)?),
        })
    }
}

#[cfg(feature = "sqlite")]
fn is_sqlite_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("db" | "sqlite" | "sqlite3")
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub store: StoreLocation,
    pub http_addr: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            store: StoreLocation::JsonFile(Path::new(DEFAULT_STORE_PATH).to_path_buf()),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
        }
    }
}

impl PlannerConfig {
    /// Reads the environment, after loading a `.env` file if one exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            store: env::var(STORE_ENV)
                .map(|value| StoreLocation::parse(&value))
                .unwrap_or(defaults.store),
            http_addr: env::var(HTTP_ADDR_ENV).unwrap_or(defaults.http_addr),
        }
    }
}
