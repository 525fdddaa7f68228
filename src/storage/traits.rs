//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::ProbeOutcome;
use crate::storage::{RunRecord, RunStatus, VerdictCounts};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines every database operation needed by a probe run.
/// Implementations are shared between domain tasks behind a mutex.
pub trait OutcomeStore {
    // ===== Run Management =====

    /// Creates a new probe run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with the given status and a finish timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Outcomes =====

    /// Inserts one domain outcome
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run the outcome belongs to
    /// * `outcome` - The finished probe outcome
    /// * `update_time` - ISO-8601 timestamp in the reporting timezone
    fn record_outcome(
        &mut self,
        run_id: i64,
        outcome: &ProbeOutcome,
        update_time: &str,
    ) -> StorageResult<i64>;

    /// Loads all outcomes of a run, in insertion order
    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<ProbeOutcome>>;

    // ===== Statistics =====

    /// Counts a run's outcomes by verdict
    fn count_by_verdict(&self, run_id: i64) -> StorageResult<VerdictCounts>;

    /// Counts a run's outcomes by last transport error, most frequent first
    fn count_by_error_kind(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;
}
