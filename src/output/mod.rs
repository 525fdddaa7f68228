//! Output module for run results and reports
//!
//! This module handles:
//! - Building the rows written to each result sheet
//! - Loading and printing per-run statistics from the database

mod report;
pub mod stats;

pub use report::{build_output_rows, OutputRow, OUTPUT_HEADERS};
pub use stats::{load_statistics, print_statistics, RunStatistics};
