//! Batch scheduler
//!
//! Runs the prober over a whole input list in fixed-size batches. Domains in
//! a batch are probed concurrently; the next batch starts only when the
//! slowest domain of the current one has finished. Output order always matches
//! input order.

use crate::probe::orchestrator::Prober;
use crate::state::{ProbeOutcome, ProbeTarget};
use crate::storage::OutcomeRecorder;
use futures::future::join_all;
use std::sync::Arc;

/// Probes targets in batches of at most `concurrency_limit`
pub struct BatchScheduler {
    prober: Arc<Prober>,
    concurrency_limit: usize,
    recorder: Option<Arc<OutcomeRecorder>>,
}

impl BatchScheduler {
    pub fn new(prober: Arc<Prober>, concurrency_limit: usize) -> Self {
        Self {
            prober,
            concurrency_limit: concurrency_limit.max(1),
            recorder: None,
        }
    }

    /// Persists each outcome as soon as its domain finishes
    pub fn with_recorder(mut self, recorder: Arc<OutcomeRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Probes every target and returns one outcome per target, in input order
    ///
    /// A domain whose task panics is reported with the `ERROR` status; the
    /// rest of its batch is unaffected.
    pub async fn run(&self, targets: &[ProbeTarget]) -> Vec<ProbeOutcome> {
        let total = targets.len();
        let total_batches = total.div_ceil(self.concurrency_limit);
        let mut outcomes = Vec::with_capacity(total);

        for (batch_index, batch) in targets.chunks(self.concurrency_limit).enumerate() {
            tracing::info!(
                "Processing batch {}/{} ({} domains)",
                batch_index + 1,
                total_batches,
                batch.len()
            );

            let handles: Vec<_> = batch
                .iter()
                .enumerate()
                .map(|(offset, target)| {
                    let prober = Arc::clone(&self.prober);
                    let recorder = self.recorder.clone();
                    let target = target.clone();
                    let position = batch_index * self.concurrency_limit + offset + 1;

                    tokio::spawn(async move {
                        tracing::info!("Processing row {}/{}: {}", position, total, target.domain);
                        let outcome = prober.probe(&target).await;
                        if let Some(recorder) = recorder {
                            recorder.record(&outcome);
                        }
                        outcome
                    })
                })
                .collect();

            for (target, joined) in batch.iter().zip(join_all(handles).await) {
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Error processing {}: {}", target.domain, e);
                        let outcome = ProbeOutcome::errored(target);
                        if let Some(recorder) = &self.recorder {
                            recorder.record(&outcome);
                        }
                        outcome
                    }
                };
                outcomes.push(outcome);
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.status_final.is_success()).count();
        tracing::info!("Probed {} domains, {} succeeded", outcomes.len(), succeeded);

        outcomes
    }
}
