use serde::Deserialize;

/// Main configuration structure for Reach-Probe
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub sheets: SheetsConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Retry engine and batch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Attempts per domain when the row does not override it
    #[serde(rename = "default-max-slots", default = "default_max_slots")]
    pub default_max_slots: u32,

    /// Per-attempt wait (seconds) when the row does not override it
    #[serde(rename = "default-max-wait-seconds", default = "default_max_wait_seconds")]
    pub default_max_wait_seconds: u64,

    /// Timeout applied to every single request (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum consecutive redirect hops chased before giving up on the chain
    #[serde(rename = "max-redirect-chase", default = "default_max_redirect_chase")]
    pub max_redirect_chase: u32,

    /// Number of domains probed in parallel per batch
    #[serde(rename = "concurrency-limit", default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            default_max_slots: default_max_slots(),
            default_max_wait_seconds: default_max_wait_seconds(),
            request_timeout_ms: default_request_timeout_ms(),
            max_redirect_chase: default_max_redirect_chase(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

/// User agent sent when no fix plan has overridden the headers
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_user_agent")]
    pub default: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            default: default_user_agent(),
        }
    }
}

/// Remote sheet service (input rows and output result sets)
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// Web app endpoint serving both `action=input` and `action=output`
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Shared secret; may be supplied through the environment instead
    #[serde(default)]
    pub token: Option<String>,

    #[serde(rename = "input-spreadsheet-id", default)]
    pub input_spreadsheet_id: Option<String>,

    #[serde(rename = "output-spreadsheet-id", default)]
    pub output_spreadsheet_id: Option<String>,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Fixed-time trigger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Offset of the reporting timezone from UTC, in whole hours
    #[serde(rename = "utc-offset-hours", default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Equally spaced runs per local day, the first at midnight
    #[serde(rename = "runs-per-day", default = "default_runs_per_day")]
    pub runs_per_day: u32,

    /// Fire one run immediately at process start
    #[serde(rename = "run-on-start", default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            runs_per_day: default_runs_per_day(),
            run_on_start: default_run_on_start(),
        }
    }
}

fn default_max_slots() -> u32 {
    3
}

fn default_max_wait_seconds() -> u64 {
    10
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_max_redirect_chase() -> u32 {
    3
}

fn default_concurrency_limit() -> usize {
    5
}

fn default_user_agent() -> String {
    "Reach-Probe-HTTP-Checker/1.0".to_string()
}

fn default_utc_offset_hours() -> i32 {
    7
}

fn default_runs_per_day() -> u32 {
    8
}

fn default_run_on_start() -> bool {
    true
}
