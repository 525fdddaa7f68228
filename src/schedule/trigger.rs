//! Fixed-time run trigger
//!
//! Fires full runs at equally spaced times of the local day (by default every
//! three hours from midnight). Runs never overlap: the next fire time is only
//! computed once the previous run has returned.

use crate::config::ScheduleConfig;
use crate::probe::Runner;
use crate::schedule::clock::{fixed_offset, iso_timestamp, now_in};
use chrono::{DateTime, Duration, FixedOffset, Timelike};
use std::future::Future;

const SECONDS_PER_DAY: u32 = 86_400;

/// Computes the first fire time strictly after `now`
///
/// Fire times are `k * (24h / runs_per_day)` past local midnight; the last
/// slot of a day rolls over to the next day's midnight.
pub fn next_fire_after(now: &DateTime<FixedOffset>, runs_per_day: u32) -> DateTime<FixedOffset> {
    let interval = SECONDS_PER_DAY / runs_per_day.clamp(1, SECONDS_PER_DAY);
    let elapsed = now.num_seconds_from_midnight();
    let next_slot = (elapsed / interval + 1) * interval;

    let midnight = *now
        - Duration::seconds(i64::from(elapsed))
        - Duration::nanoseconds(i64::from(now.nanosecond()));
    midnight + Duration::seconds(i64::from(next_slot))
}

/// Completes on Ctrl-C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

async fn run_logged(runner: &Runner) {
    match runner.run_once().await {
        Ok(summary) => tracing::info!(
            "Run finished: sheet={} domains={} succeeded={}",
            summary.sheet_name,
            summary.total,
            summary.succeeded
        ),
        Err(e) => tracing::error!("Run failed: {}", e),
    }
}

/// Runs on the configured schedule until `shutdown` completes
///
/// A run in progress when `shutdown` fires is dropped at its next await point.
pub async fn run_forever<F>(runner: &Runner, schedule: &ScheduleConfig, shutdown: F)
where
    F: Future<Output = ()>,
{
    let offset = fixed_offset(schedule.utc_offset_hours);
    tokio::pin!(shutdown);

    if schedule.run_on_start {
        tracing::info!("Running once at start");
        tokio::select! {
            _ = &mut shutdown => return,
            _ = run_logged(runner) => {}
        }
    }

    loop {
        let now = now_in(offset);
        let next = next_fire_after(&now, schedule.runs_per_day);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!("Next run at {}", iso_timestamp(&next));

        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(wait) => {}
        }

        tokio::select! {
            _ = &mut shutdown => return,
            _ = run_logged(runner) => {}
        }
    }
}
