//! HTTP client for the sheet web service
//!
//! The service exposes a single endpoint: `GET ?action=input` returns the rows
//! to probe, `POST {action: "output", ...}` writes one result sheet. Every
//! response carries an `ok` flag; `ok: false` aborts the run.

use crate::config::SheetsConfig;
use crate::output::{OutputRow, OUTPUT_HEADERS};
use crate::sheets::rows::InputRow;
use crate::{ProbeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const INPUT_TIMEOUT: Duration = Duration::from_secs(20);
const OUTPUT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    ok: bool,

    #[serde(default)]
    rows: Option<Vec<InputRow>>,

    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputRequest<'a> {
    action: &'static str,
    token: &'a str,
    sheet_name: &'a str,
    headers: &'a [&'static str],
    data: &'a [OutputRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    output_spreadsheet_id: Option<&'a str>,
}

/// Client for reading input rows and writing result sheets
pub struct SheetClient {
    client: Client,
    api_url: String,
    token: String,
    input_spreadsheet_id: Option<String>,
    output_spreadsheet_id: Option<String>,
}

impl SheetClient {
    /// Creates a client for the configured endpoint
    ///
    /// `token` is passed separately since it may come from the environment
    /// rather than the config file.
    pub fn new(config: &SheetsConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: token.into(),
            input_spreadsheet_id: config.input_spreadsheet_id.clone().filter(|s| !s.is_empty()),
            output_spreadsheet_id: config.output_spreadsheet_id.clone().filter(|s| !s.is_empty()),
        })
    }

    /// Fetches the input rows
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<InputRow>)` - The rows, possibly empty
    /// * `Err(ProbeError::Http)` - The service could not be reached or answered garbage
    /// * `Err(ProbeError::Sheets)` - The service answered `ok: false`
    pub async fn fetch_rows(&self) -> Result<Vec<InputRow>> {
        let mut query = vec![("action", "input"), ("token", self.token.as_str())];
        if let Some(id) = &self.input_spreadsheet_id {
            query.push(("inputSpreadsheetId", id.as_str()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .timeout(INPUT_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let body = self.read_response(response).await?;
        if !body.ok {
            return Err(ProbeError::Sheets(
                body.error.unwrap_or_else(|| "input request rejected".to_string()),
            ));
        }

        Ok(body.rows.unwrap_or_default())
    }

    /// Writes one result sheet
    pub async fn post_output(&self, sheet_name: &str, rows: &[OutputRow]) -> Result<()> {
        let payload = OutputRequest {
            action: "output",
            token: &self.token,
            sheet_name,
            headers: OUTPUT_HEADERS,
            data: rows,
            output_spreadsheet_id: self.output_spreadsheet_id.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&payload)
            .timeout(OUTPUT_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let body = self.read_response(response).await?;
        if !body.ok {
            return Err(ProbeError::Sheets(
                body.error.unwrap_or_else(|| "output request rejected".to_string()),
            ));
        }

        tracing::debug!("Wrote {} rows to sheet {}", rows.len(), sheet_name);
        Ok(())
    }

    async fn read_response(&self, response: reqwest::Response) -> Result<ServiceResponse> {
        let response = response.error_for_status().map_err(|e| self.http_error(e))?;
        response
            .json::<ServiceResponse>()
            .await
            .map_err(|e| self.http_error(e))
    }

    /// Wraps a request error; the query string carries the token, so it is dropped
    fn http_error(&self, source: reqwest::Error) -> ProbeError {
        ProbeError::Http {
            url: self.api_url.clone(),
            source: source.without_url(),
        }
    }
}
