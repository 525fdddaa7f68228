//! Sheet service module
//!
//! Reads the rows to probe from, and writes result sheets to, the remote
//! spreadsheet web service.

mod client;
mod rows;

pub use client::SheetClient;
pub use rows::{masked_row, normalize_key, target_from_row, InputRow};
