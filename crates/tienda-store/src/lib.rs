#![forbid(unsafe_code)]
//! SQLite persistence for users, catalog, clients, carts and sales.
//!
//! Every public operation opens its own connection, so a [`Store`] is cheap to
//! clone and safe to hand to blocking worker threads. Writes that must observe
//! and change stock atomically run inside `BEGIN IMMEDIATE` transactions,
//! which hold the database write lock for their whole duration.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

mod cart;
mod catalog;
mod clients;
mod error;
mod rows;
mod sales;
mod schema;
mod users;

pub use error::StoreError;
pub use schema::SQLITE_SCHEMA_VERSION;

pub const CRATE_NAME: &str = "tienda-store";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("artifacts/tienda.sqlite"),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    cfg: StoreConfig,
}

impl Store {
    /// Opens (creating if needed) the database file and migrates the schema.
    pub fn open(cfg: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = cfg.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { cfg };
        let conn = store.connect()?;
        schema::ensure_schema(&conn)?;
        info!(path = %store.cfg.path.display(), "store ready");
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.cfg.path
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.cfg.path)?;
        let busy_ms = u64::try_from(self.cfg.busy_timeout.as_millis()).unwrap_or(u64::MAX);
        schema::apply_connection_pragmas(&conn, busy_ms)?;
        Ok(conn)
    }
}
