//! One full probe pass
//!
//! Fetch input rows, probe every domain, write the result sheet and record
//! the run in the database.

use crate::config::Config;
use crate::output::build_output_rows;
use crate::probe::executor::{AttemptExecutor, HttpExecutor};
use crate::probe::orchestrator::{Prober, Sleeper, TokioSleeper};
use crate::probe::scheduler::BatchScheduler;
use crate::schedule::{fixed_offset, iso_timestamp, now_in, sheet_name};
use crate::sheets::{masked_row, target_from_row, SheetClient};
use crate::state::ProbeTarget;
use crate::storage::{open_store, OutcomeRecorder, RunStatus, SharedStore};
use crate::Result;
use chrono::FixedOffset;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Option<i64>,
    pub sheet_name: String,
    pub total: usize,
    pub succeeded: usize,
}

/// Executes complete probe passes
pub struct Runner {
    config: Config,
    config_hash: String,
    sheets: SheetClient,
    prober: Arc<Prober>,
    store: SharedStore,
    offset: FixedOffset,
}

impl Runner {
    /// Wires the production collaborators from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `config_hash` - Hash of the configuration file, recorded per run
    /// * `token` - Sheet service token
    pub fn from_config(config: Config, config_hash: String, token: String) -> Result<Self> {
        let executor = HttpExecutor::new(
            Duration::from_millis(config.probe.request_timeout_ms),
            config.user_agent.default.clone(),
        )?;
        let store = open_store(Path::new(&config.storage.database_path))?;
        let sheets = SheetClient::new(&config.sheets, token)?;

        Ok(Self::new(
            config,
            config_hash,
            sheets,
            Arc::new(executor),
            Arc::new(TokioSleeper),
            Arc::new(Mutex::new(store)),
        ))
    }

    /// Creates a runner over explicit collaborators
    pub fn new(
        config: Config,
        config_hash: String,
        sheets: SheetClient,
        executor: Arc<dyn AttemptExecutor>,
        sleeper: Arc<dyn Sleeper>,
        store: SharedStore,
    ) -> Self {
        let prober = Arc::new(Prober::new(executor, sleeper, config.probe.max_redirect_chase));
        let offset = fixed_offset(config.schedule.utc_offset_hours);

        Self {
            config,
            config_hash,
            sheets,
            prober,
            store,
            offset,
        }
    }

    /// The prober shared by every run
    pub fn prober(&self) -> Arc<Prober> {
        Arc::clone(&self.prober)
    }

    /// Runs one complete pass
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The result sheet was written
    /// * `Err(ProbeError)` - Input could not be read or output could not be written
    pub async fn run_once(&self) -> Result<RunSummary> {
        tracing::info!("Starting domain check process");

        let rows = self.sheets.fetch_rows().await?;
        tracing::info!("Retrieved {} rows", rows.len());
        if let Some(first) = rows.first() {
            tracing::debug!("Sample row: {}", masked_row(first));
        }

        let targets: Vec<ProbeTarget> = rows
            .iter()
            .map(|row| target_from_row(row, &self.config.probe))
            .collect();

        let run_id = self.start_run();
        let mut scheduler =
            BatchScheduler::new(Arc::clone(&self.prober), self.config.probe.concurrency_limit);
        if let Some(run_id) = run_id {
            scheduler = scheduler.with_recorder(Arc::new(OutcomeRecorder::new(
                Arc::clone(&self.store),
                run_id,
                self.offset,
            )));
        }

        let outcomes = scheduler.run(&targets).await;

        let completed_at = now_in(self.offset);
        let name = sheet_name(&completed_at);
        let output = build_output_rows(&outcomes, &iso_timestamp(&completed_at));

        if let Err(e) = self.sheets.post_output(&name, &output).await {
            self.finish_run(run_id, RunStatus::Failed);
            return Err(e);
        }
        self.finish_run(run_id, RunStatus::Completed);

        let succeeded = outcomes.iter().filter(|o| o.status_final.is_success()).count();
        tracing::info!("DONE outputSheet={} rows={}", name, output.len());

        Ok(RunSummary {
            run_id,
            sheet_name: name,
            total: outcomes.len(),
            succeeded,
        })
    }

    fn start_run(&self) -> Option<i64> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match store.create_run(&self.config_hash) {
            Ok(run_id) => {
                tracing::info!("Started run #{}", run_id);
                Some(run_id)
            }
            Err(e) => {
                tracing::error!("Failed to record run start, outcomes will not be saved: {}", e);
                None
            }
        }
    }

    fn finish_run(&self, run_id: Option<i64>, status: RunStatus) {
        let Some(run_id) = run_id else {
            return;
        };
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store.finish_run(run_id, status) {
            tracing::error!("Failed to mark run #{} {}: {}", run_id, status.to_db_string(), e);
        }
    }
}
