//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the OutcomeStore trait.

use crate::state::{ProbeOutcome, TransportErrorKind, Verdict};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{OutcomeStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, VerdictCounts};
use crate::ProbeError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(ProbeError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ProbeError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ProbeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
    })
}

fn outcome_from_row(row: &Row<'_>) -> rusqlite::Result<ProbeOutcome> {
    let status_final: String = row.get(4)?;
    let error_kind: Option<String> = row.get(9)?;

    Ok(ProbeOutcome {
        domain: row.get(0)?,
        isp: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        dns: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        status_http: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        status_final: Verdict::from_db_string(&status_final).unwrap_or(Verdict::Fail),
        content_snippet: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        resolved_redirect_url: row.get(6)?,
        tried_count: row.get::<_, Option<u32>>(7)?.unwrap_or(0),
        last_url: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        last_error: error_kind.as_deref().and_then(TransportErrorKind::from_db_string),
    })
}

impl OutcomeStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Outcomes =====

    fn record_outcome(
        &mut self,
        run_id: i64,
        outcome: &ProbeOutcome,
        update_time: &str,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO domain_checks (
                run_id, domain, isp, dns, update_time, status_http, status_final,
                content, resolved_url, tried_count, last_url, error_kind
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                run_id,
                outcome.domain,
                outcome.isp,
                outcome.dns,
                update_time,
                outcome.status_http,
                outcome.status_final.to_db_string(),
                outcome.content_snippet,
                outcome.resolved_redirect_url,
                outcome.tried_count,
                outcome.last_url,
                outcome.last_error.map(|e| e.to_db_string()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<ProbeOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, isp, dns, status_http, status_final, content,
                    resolved_url, tried_count, last_url, error_kind
             FROM domain_checks WHERE run_id = ?1 ORDER BY id",
        )?;

        let outcomes = stmt
            .query_map(params![run_id], outcome_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(outcomes)
    }

    // ===== Statistics =====

    fn count_by_verdict(&self, run_id: i64) -> StorageResult<VerdictCounts> {
        let mut stmt = self.conn.prepare(
            "SELECT status_final, COUNT(*) FROM domain_checks WHERE run_id = ?1 GROUP BY status_final",
        )?;

        let mut counts = VerdictCounts::default();
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (verdict, count) = row?;
            let count = count as u64;
            match Verdict::from_db_string(&verdict) {
                Some(Verdict::Success) => counts.success += count,
                _ => counts.fail += count,
            }
        }

        Ok(counts)
    }

    fn count_by_error_kind(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT error_kind, COUNT(*) AS n FROM domain_checks
             WHERE run_id = ?1 AND error_kind IS NOT NULL
             GROUP BY error_kind ORDER BY n DESC, error_kind",
        )?;

        let counts = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
