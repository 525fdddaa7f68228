//! Result sheet rows
//!
//! Turns finished probe outcomes into the rows written to the output sheet.

use crate::state::ProbeOutcome;
use serde::Serialize;

/// Column order of every result sheet
pub const OUTPUT_HEADERS: &[&str] = &[
    "Domain",
    "ISP",
    "DNS",
    "Update",
    "StatusHTTP",
    "StatusFinal",
    "URL",
    "ContentDomain",
];

/// One output sheet row, keyed by header name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "Domain")]
    pub domain: String,

    #[serde(rename = "ISP")]
    pub isp: String,

    #[serde(rename = "DNS")]
    pub dns: String,

    #[serde(rename = "Update")]
    pub update: String,

    #[serde(rename = "StatusHTTP")]
    pub status_http: String,

    #[serde(rename = "StatusFinal")]
    pub status_final: String,

    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "ContentDomain")]
    pub content_domain: String,
}

impl OutputRow {
    pub fn from_outcome(outcome: &ProbeOutcome, update: &str) -> Self {
        Self {
            domain: outcome.domain.clone(),
            isp: outcome.isp.clone(),
            dns: outcome.dns.clone(),
            update: update.to_string(),
            status_http: outcome.status_http.clone(),
            status_final: outcome.status_final.to_db_string().to_string(),
            url: outcome.reported_url().to_string(),
            content_domain: outcome.content_snippet.clone(),
        }
    }
}

/// Builds the output rows of a run, all stamped with the completion time
pub fn build_output_rows(outcomes: &[ProbeOutcome], update: &str) -> Vec<OutputRow> {
    outcomes
        .iter()
        .map(|outcome| OutputRow::from_outcome(outcome, update))
        .collect()
}
