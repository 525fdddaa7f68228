//! Failure classification and next-attempt planning
//!
//! Every failed attempt is turned into a [`FixPlan`]: how much longer to wait,
//! which headers to send, and which URL(s) to try next. Classification is a
//! pure function of the attempt's outcome; it holds no state between calls.

use crate::state::TransportErrorKind;
use crate::url::{build_candidate_urls, resolve_location};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, USER_AGENT};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7";

/// Extra wait after a timeout
pub const TIMEOUT_DELAY_MS: u64 = 2_000;
/// Extra wait after a refused, reset or unresolvable connection
pub const CONNECTION_DELAY_MS: u64 = 2_000;
/// Extra wait after HTTP 429
pub const RATE_LIMIT_DELAY_MS: u64 = 10_000;
/// Extra wait after HTTP 403/406
pub const FORBIDDEN_DELAY_MS: u64 = 3_000;
/// Extra wait after HTTP 5xx
pub const SERVER_ERROR_DELAY_MS: u64 = 4_000;

/// The adaptive response to one failed attempt
#[derive(Debug, Clone, PartialEq)]
pub struct FixPlan {
    /// Added on top of the target's base delay before the next slot
    pub extra_delay_ms: u64,

    /// Headers for every following attempt, replacing the executor defaults
    pub header_override: Option<HeaderMap>,

    /// URLs to try next, in preference order
    pub next_urls: Vec<String>,
}

impl FixPlan {
    fn browser(extra_delay_ms: u64, next_urls: Vec<String>) -> Self {
        Self {
            extra_delay_ms,
            header_override: Some(browser_headers()),
            next_urls,
        }
    }

    /// Picks the next URL, preferring one that differs from `current_url`
    ///
    /// Falls back to the first offered URL, then to `current_url` itself when
    /// the plan offers nothing.
    pub fn pick_next_url(&self, current_url: &str) -> String {
        self.next_urls
            .iter()
            .find(|url| url.as_str() != current_url)
            .or_else(|| self.next_urls.first())
            .cloned()
            .unwrap_or_else(|| current_url.to_string())
    }
}

/// What went wrong with the attempt being classified
#[derive(Debug, Clone, Copy)]
pub struct Failure<'a> {
    pub status: Option<u16>,
    pub transport: Option<TransportErrorKind>,
    pub redirect_location: Option<&'a str>,
}

impl<'a> Failure<'a> {
    pub fn http(status: u16, redirect_location: Option<&'a str>) -> Self {
        Self {
            status: Some(status),
            transport: None,
            redirect_location,
        }
    }

    pub fn transport(kind: TransportErrorKind) -> Self {
        Self {
            status: None,
            transport: Some(kind),
            redirect_location: None,
        }
    }
}

/// Header set that makes the probe look like a desktop browser
///
/// Used for every retry once any failure has been seen.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Decides how to retry after a failed attempt
///
/// # Decision Table
///
/// Checked in order, first match wins. Every row switches to browser headers.
///
/// | Condition | Extra delay | Next URLs |
/// |-----------|-------------|-----------|
/// | Timeout | 2s | same URL |
/// | Refused / reset / host not found | 2s | fresh candidate list |
/// | HTTP 429 | 10s | same URL |
/// | HTTP 403, 406 | 3s | same URL |
/// | HTTP 404 | 0 | fresh candidate list |
/// | HTTP 3xx with Location | 0 | resolved Location (same URL if unresolvable) |
/// | HTTP 5xx | 4s | same URL |
/// | Anything else | 0 | same URL |
pub fn classify(failure: Failure<'_>, current_url: &str, domain: &str) -> FixPlan {
    let same = || vec![current_url.to_string()];

    match failure.transport {
        Some(TransportErrorKind::Timeout) => {
            return FixPlan::browser(TIMEOUT_DELAY_MS, same());
        }
        Some(kind) if kind.is_connection_failure() => {
            return FixPlan::browser(CONNECTION_DELAY_MS, build_candidate_urls(domain));
        }
        _ => {}
    }

    let Some(status) = failure.status else {
        return FixPlan::browser(0, same());
    };

    match status {
        429 => FixPlan::browser(RATE_LIMIT_DELAY_MS, same()),
        403 | 406 => FixPlan::browser(FORBIDDEN_DELAY_MS, same()),
        404 => FixPlan::browser(0, build_candidate_urls(domain)),
        300..=399 if failure.redirect_location.is_some() => {
            let next = failure
                .redirect_location
                .and_then(|location| resolve_location(location, current_url))
                .unwrap_or_else(|| current_url.to_string());
            FixPlan::browser(0, vec![next])
        }
        500..=599 => FixPlan::browser(SERVER_ERROR_DELAY_MS, same()),
        _ => FixPlan::browser(0, same()),
    }
}

/// Returns true for a 3xx status that carries a Location to chase
pub fn is_chaseable_redirect(status: u16, redirect_location: Option<&str>) -> bool {
    (300..=399).contains(&status) && redirect_location.is_some()
}
