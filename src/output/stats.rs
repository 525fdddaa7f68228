//! Statistics generation from the probe database
//!
//! This module provides functionality for extracting and displaying
//! run statistics from the storage layer.

use crate::storage::{OutcomeStore, RunRecord, VerdictCounts};
use crate::ProbeError;

/// Statistics of one probe run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// The run these figures belong to
    pub run: RunRecord,

    /// Outcome counts by verdict
    pub verdicts: VerdictCounts,

    /// Last transport error kinds and their counts, most frequent first
    pub error_summary: Vec<(String, u64)>,

    /// Domains that did not succeed, in probe order
    pub failed_domains: Vec<String>,
}

/// Loads statistics of the most recent run
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(Some(RunStatistics))` - Statistics of the latest run
/// * `Ok(None)` - The database holds no runs yet
/// * `Err(ProbeError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn OutcomeStore) -> Result<Option<RunStatistics>, ProbeError> {
    let Some(run) = storage.get_latest_run()? else {
        return Ok(None);
    };

    let verdicts = storage.count_by_verdict(run.id)?;
    let error_summary = storage.count_by_error_kind(run.id)?;
    let failed_domains = storage
        .get_outcomes(run.id)?
        .into_iter()
        .filter(|o| !o.status_final.is_success())
        .map(|o| o.domain)
        .collect();

    Ok(Some(RunStatistics {
        run,
        verdicts,
        error_summary,
        failed_domains,
    }))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Probe Statistics ===\n");

    println!("Run #{}:", stats.run.id);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Config hash: {}", stats.run.config_hash);
    println!();

    let total = stats.verdicts.total();
    let success_rate = if total > 0 {
        (stats.verdicts.success as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    println!("Verdicts:");
    println!("  Domains probed: {}", total);
    println!("  SUCCESS: {}", stats.verdicts.success);
    println!("  FAIL: {}", stats.verdicts.fail);
    println!("  Success rate: {:.1}%", success_rate);
    println!();

    if !stats.error_summary.is_empty() {
        println!("Last Transport Errors:");
        for (kind, count) in &stats.error_summary {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.failed_domains.is_empty() {
        println!("Failed Domains ({}):", stats.failed_domains.len());
        for domain in &stats.failed_domains {
            println!("  - {}", domain);
        }
        println!();
    }
}
