use crate::config::types::{Config, ProbeConfig, ScheduleConfig, SheetsConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_probe_config(&config.probe)?;
    validate_user_agent(&config.user_agent.default)?;
    validate_sheets_config(&config.sheets)?;
    validate_storage_config(&config.storage)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

/// Validates retry and batch settings
fn validate_probe_config(config: &ProbeConfig) -> Result<(), ConfigError> {
    if config.default_max_slots < 1 {
        return Err(ConfigError::Validation(format!(
            "default_max_slots must be >= 1, got {}",
            config.default_max_slots
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent default cannot be empty".to_string(),
        ));
    }

    if reqwest::header::HeaderValue::from_str(user_agent).is_err() {
        return Err(ConfigError::Validation(format!(
            "user-agent '{}' is not a valid header value",
            user_agent
        )));
    }

    Ok(())
}

/// Validates the sheet service endpoint
fn validate_sheets_config(config: &SheetsConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "api_url '{}' must use http or https",
            config.api_url
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the trigger settings
///
/// Runs must split a day into whole minutes so every fire time lands on a
/// minute boundary.
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if !(-12..=14).contains(&config.utc_offset_hours) {
        return Err(ConfigError::Validation(format!(
            "utc_offset_hours must be between -12 and 14, got {}",
            config.utc_offset_hours
        )));
    }

    if config.runs_per_day < 1 || 1440 % config.runs_per_day != 0 {
        return Err(ConfigError::Validation(format!(
            "runs_per_day must be >= 1 and divide 1440 minutes evenly, got {}",
            config.runs_per_day
        )));
    }

    Ok(())
}
