//! Storage module for persisting probe results
//!
//! This module handles all database operations for the prober, including:
//! - SQLite database initialization and additive schema migration
//! - Run tracking (start, finish, status, configuration hash)
//! - One row per probed domain per run
//! - Verdict and error statistics for reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{OutcomeStore, StorageError, StorageResult};

use crate::schedule::{iso_timestamp, now_in};
use crate::state::ProbeOutcome;
use crate::ProbeError;
use chrono::FixedOffset;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Store handle shared between concurrent domain tasks
pub type SharedStore = Arc<Mutex<dyn OutcomeStore + Send>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(ProbeError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> Result<SqliteStore, ProbeError> {
    SqliteStore::new(path)
}

/// Represents a probe run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a probe run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Outcome counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerdictCounts {
    pub success: u64,
    pub fail: u64,
}

impl VerdictCounts {
    pub fn total(&self) -> u64 {
        self.success + self.fail
    }
}

/// Persists outcomes of one run as domains finish
///
/// Insert failures are logged and swallowed: a broken database never costs a
/// domain its place in the output sheet.
pub struct OutcomeRecorder {
    store: SharedStore,
    run_id: i64,
    offset: FixedOffset,
}

impl OutcomeRecorder {
    pub fn new(store: SharedStore, run_id: i64, offset: FixedOffset) -> Self {
        Self {
            store,
            run_id,
            offset,
        }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Inserts one outcome stamped with the current time
    pub fn record(&self, outcome: &ProbeOutcome) {
        let update_time = iso_timestamp(&now_in(self.offset));
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = store.record_outcome(self.run_id, outcome, &update_time) {
            tracing::error!("Error saving to DB domain={}: {}", outcome.domain, e);
        }
    }
}
