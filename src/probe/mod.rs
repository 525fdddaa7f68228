//! Probe module for domain reachability checks
//!
//! This module provides the core probing functionality:
//! - Executing single HTTP attempts, optionally through a proxy
//! - Classifying failures into adaptive fix plans
//! - Orchestrating per-domain retry sequences
//! - Scheduling domains in bounded concurrent batches
//! - Running complete input-to-output passes
//!
//! # Architecture
//!
//! A pass is driven by the [`Runner`], which reads rows from the sheet service
//! and hands the resulting targets to the [`BatchScheduler`]. Each target is
//! probed by the shared [`Prober`], which calls an [`AttemptExecutor`] once per
//! slot and asks [`classify`] how to retry after each failure.

mod executor;
mod extract;
mod fix_plan;
mod orchestrator;
mod run;
mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use executor::{build_http_client, classify_transport_error, AttemptExecutor, HttpExecutor};
pub use extract::{extract_snippet, PageSnippet, MAX_SNIPPET_WORDS};
pub use fix_plan::{browser_headers, classify, is_chaseable_redirect, Failure, FixPlan};
pub use orchestrator::{
    ProbeState, Prober, Sleeper, Step, TokioSleeper, TransitionContext, WorkingState, GRACE_MS,
};
pub use run::{RunSummary, Runner};
pub use scheduler::BatchScheduler;
