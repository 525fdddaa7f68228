//! Configuration module for Reach-Probe
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reach_probe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Attempts per domain: {}", config.probe.default_max_slots);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ProbeConfig, ScheduleConfig, SheetsConfig, StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
