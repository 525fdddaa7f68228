//! Scheduling module
//!
//! This module handles:
//! - Rendering timestamps and sheet names at the reporting offset
//! - Computing fixed fire times across the local day
//! - Driving repeated runs until shutdown

mod clock;
mod trigger;

pub use clock::{fixed_offset, iso_timestamp, now_in, sheet_name};
pub use trigger::{next_fire_after, run_forever, shutdown_signal};
