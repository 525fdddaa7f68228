//! HTTP attempt executor
//!
//! This module performs the single outbound request behind each probe slot:
//! - Building HTTP clients (one per distinct proxy) with redirects disabled
//! - Sending one GET with default or fix-plan headers
//! - Returning every HTTP status to the caller, 3xx included
//! - Classifying transport failures
//! - Extracting the content snippet of a 200 response

use crate::probe::extract::{collapse_whitespace, extract_snippet, MAX_SNIPPET_WORDS};
use crate::state::{AttemptKind, AttemptResult, TransportErrorKind};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Proxy};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Length of the raw body prefix written to the attempt log
const LOG_BODY_PREFIX_CHARS: usize = 300;

/// Performs exactly one probe attempt
///
/// Implementations must never fail for a received HTTP response; only
/// transport-level problems become [`TransportErrorKind`]s.
#[async_trait]
pub trait AttemptExecutor: Send + Sync {
    async fn execute(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> AttemptResult;
}

/// Builds an HTTP client for probing
///
/// # Arguments
///
/// * `timeout` - Whole-request timeout
/// * `user_agent` - User agent sent when no headers are overridden
/// * `proxy` - Canonical proxy URL, or None for a direct connection
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - The proxy URL was rejected or the TLS backend failed
///
/// # Example
///
/// ```no_run
/// use reach_probe::probe::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(15), "Checker/1.0", None).unwrap();
/// ```
pub fn build_http_client(
    timeout: Duration,
    user_agent: &str,
    proxy: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    let builder = Client::builder()
        .user_agent(user_agent)
        .default_headers(default_headers)
        .timeout(timeout)
        .redirect(Policy::none()) // 3xx goes back to the orchestrator
        .gzip(true)
        .brotli(true);

    let builder = match proxy {
        Some(proxy_url) => builder.proxy(Proxy::all(proxy_url)?),
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Production executor backed by `reqwest`
///
/// Clients are created lazily per proxy and reused for the process lifetime.
pub struct HttpExecutor {
    timeout: Duration,
    user_agent: String,
    direct: Client,
    proxied: Mutex<HashMap<String, Client>>,
}

impl HttpExecutor {
    /// Creates an executor with a direct (proxy-less) client ready
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Result<Self, reqwest::Error> {
        let user_agent = user_agent.into();
        let direct = build_http_client(timeout, &user_agent, None)?;
        Ok(Self {
            timeout,
            user_agent,
            direct,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
        let Some(proxy_url) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut clients = self.proxied.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(proxy_url) {
            return Ok(client.clone());
        }

        let client = build_http_client(self.timeout, &self.user_agent, Some(proxy_url))?;
        clients.insert(proxy_url.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl AttemptExecutor for HttpExecutor {
    async fn execute(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> AttemptResult {
        let client = match self.client_for(proxy) {
            Ok(client) => client,
            Err(e) => {
                // The proxy string may carry credentials; keep it out of the log
                tracing::warn!("Rejected proxy descriptor for {}: {}", url, e.without_url());
                return AttemptResult::transport(TransportErrorKind::Unclassified);
            }
        };

        let mut request = client.get(url);
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let kind = classify_transport_error(&e);
                tracing::debug!("[HTTP] url={} error={} kind={}", url, e, kind);
                return AttemptResult::transport(kind);
            }
        };

        let status = response.status().as_u16();
        let content_type = header_string(response.headers(), CONTENT_TYPE);
        let location = header_string(response.headers(), LOCATION);

        // The request timeout also covers the body; a stalled or cut-short
        // body is a transport failure, not a response
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let kind = classify_transport_error(&e);
                tracing::debug!(
                    "[HTTP] url={} status={} body error={} kind={}",
                    url,
                    status,
                    e,
                    kind
                );
                return AttemptResult::transport(kind);
            }
        };

        let snippet = extract_snippet(&body, MAX_SNIPPET_WORDS);
        let head: String = collapse_whitespace(
            &body.chars().take(LOG_BODY_PREFIX_CHARS).collect::<String>(),
        );
        tracing::debug!(
            "[HTTP] url={} status={} ct={} loc={} title={:?} head={:?}",
            url,
            status,
            content_type,
            location,
            snippet.title.as_deref().unwrap_or(""),
            head
        );

        AttemptResult {
            kind: AttemptKind::Http(status),
            redirect_location: Some(location).filter(|loc| !loc.is_empty()),
            snippet: if status == 200 {
                snippet.into_content()
            } else {
                String::new()
            },
        }
    }
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Maps a `reqwest` failure onto the transport error taxonomy
///
/// The error's flags are checked first, then its source chain: typed
/// `std::io::Error` kinds where present, message text otherwise.
pub fn classify_transport_error(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_timeout() {
        return TransportErrorKind::Timeout;
    }

    let mut messages = Vec::new();
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return TransportErrorKind::ConnectionRefused
                }
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                    return TransportErrorKind::ConnectionReset
                }
                std::io::ErrorKind::TimedOut => return TransportErrorKind::Timeout,
                _ => {}
            }
        }
        messages.push(err.to_string().to_lowercase());
        source = err.source();
    }

    classify_error_message(&messages.join(": "))
}

/// Classifies a lowercased error description
fn classify_error_message(message: &str) -> TransportErrorKind {
    if message.contains("certificate") || message.contains("invalid peer") {
        TransportErrorKind::CertificateError
    } else if message.contains("dns error")
        || message.contains("failed to lookup address")
        || message.contains("name or service not known")
        || message.contains("no such host")
    {
        TransportErrorKind::HostNotFound
    } else if message.contains("connection refused") {
        TransportErrorKind::ConnectionRefused
    } else if message.contains("connection reset") || message.contains("broken pipe") {
        TransportErrorKind::ConnectionReset
    } else if message.contains("timed out") || message.contains("timeout") {
        TransportErrorKind::Timeout
    } else {
        TransportErrorKind::Unclassified
    }
}
