//! State module for probe attempts and outcomes
//!
//! # Components
//!
//! - `AttemptResult` / `AttemptKind`: what a single request came back with
//! - `TransportErrorKind`: classified network-level failures
//! - `ProbeTarget` / `ProbeOutcome` / `Verdict`: per-domain input and result

mod attempt;
mod outcome;

// Re-export main types
pub use attempt::{AttemptKind, AttemptResult, TransportErrorKind};
pub use outcome::{ProbeOutcome, ProbeTarget, Verdict, ERROR_STATUS};
