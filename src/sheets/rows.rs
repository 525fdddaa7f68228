//! Input row interpretation
//!
//! Rows arrive as loosely-typed JSON objects whose keys follow whatever the
//! sheet's header row says. Keys are compared after lowercasing and removing
//! spaces and underscores, so `Max Slot try`, `Max_Slot_try` and `maxslottry`
//! all name the same column.

use crate::config::ProbeConfig;
use crate::state::ProbeTarget;
use serde_json::{Map, Value};

/// One input row as returned by the sheet service
pub type InputRow = Map<String, Value>;

const DOMAIN_KEYS: &[&str] = &["domain"];
const PROXY_KEYS: &[&str] = &["proxyipportuserpass", "proxy"];
const ISP_KEYS: &[&str] = &["isp"];
const DNS_KEYS: &[&str] = &["dns"];
const MAX_SLOT_KEYS: &[&str] = &["maxslottry", "maxslot"];
const MAX_WAIT_KEYS: &[&str] = &["maxtimetry", "maxtime"];

/// Normalizes a column name for alias matching
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Renders a cell as text; numbers and booleans are accepted alongside strings
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Looks up the first non-empty cell among the given aliases
fn lookup(row: &InputRow, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        row.iter()
            .find(|(key, _)| normalize_key(key) == *alias)
            .and_then(|(_, value)| cell_text(value))
            .filter(|text| !text.is_empty())
    })
}

/// Parses a numeric cell, accepting `"5"`, `5` and `5.0`
fn lookup_number(row: &InputRow, aliases: &[&str]) -> Option<u64> {
    let text = lookup(row, aliases)?;
    if let Ok(n) = text.parse::<u64>() {
        return Some(n);
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
}

/// Builds a probe target from an input row
///
/// The domain cell is kept as entered (trimmed) so reports echo the input;
/// candidate generation normalizes it. Missing or unparsable per-row
/// overrides fall back to the configured defaults. The slot budget is
/// clamped to at least one.
pub fn target_from_row(row: &InputRow, defaults: &ProbeConfig) -> ProbeTarget {
    let domain = lookup(row, DOMAIN_KEYS).unwrap_or_default();

    let max_slots = lookup_number(row, MAX_SLOT_KEYS)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(defaults.default_max_slots);
    let max_wait_seconds =
        lookup_number(row, MAX_WAIT_KEYS).unwrap_or(defaults.default_max_wait_seconds);

    ProbeTarget::new(domain, max_slots, max_wait_seconds)
        .with_proxy(lookup(row, PROXY_KEYS).unwrap_or_default())
        .with_metadata(
            lookup(row, ISP_KEYS).unwrap_or_default(),
            lookup(row, DNS_KEYS).unwrap_or_default(),
        )
}

/// Renders a row for logging with proxy credentials hidden
pub fn masked_row(row: &InputRow) -> String {
    let mut masked = row.clone();
    for (key, value) in masked.iter_mut() {
        if PROXY_KEYS.contains(&normalize_key(key).as_str()) && !value.is_null() {
            *value = Value::String("***".to_string());
        }
    }
    Value::Object(masked).to_string()
}
