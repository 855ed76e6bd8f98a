//! Persistence layer for mm-core correlation runs.
//!
//! Each run lands in a local SQLite database (WAL mode) together with its
//! ranked moments, keyed by the video id the events came from.

pub mod error;
pub mod schema;
pub mod store;

use std::env;
use std::path::PathBuf;

pub use error::{Result, StoreError};
pub use schema::{SCHEMA_VERSION, get_schema_version, initialize};
pub use store::{RunSummary, Store, StoredRun};

/// Default base directory for all moment-miner storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".moment-miner")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Database path under a base directory, creating the directory if needed.
pub fn database_path(base_dir: &std::path::Path) -> Result<PathBuf> {
    std::fs::create_dir_all(base_dir)
        .map_err(|e| StoreError::InvalidData(format!("cannot create {}: {e}", base_dir.display())))?;
    Ok(base_dir.join("runs.db"))
}
