//! Per-domain input and final result types

use crate::state::TransportErrorKind;
use std::fmt;

/// Status marker used when orchestration itself crashed for a domain
pub const ERROR_STATUS: &str = "ERROR";

/// One domain to probe, built from an input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub domain: String,

    /// Free-form proxy descriptor, empty when the row has none
    pub proxy_raw: String,

    /// Attempt budget, always >= 1
    pub max_slots: u32,

    /// Per-attempt wait in seconds, added to the fixed grace margin
    pub max_wait_seconds: u64,

    pub isp: String,
    pub dns: String,
}

impl ProbeTarget {
    /// Creates a target with no proxy and empty metadata
    pub fn new(domain: impl Into<String>, max_slots: u32, max_wait_seconds: u64) -> Self {
        Self {
            domain: domain.into(),
            proxy_raw: String::new(),
            max_slots: max_slots.max(1),
            max_wait_seconds,
            isp: String::new(),
            dns: String::new(),
        }
    }

    pub fn with_proxy(mut self, proxy_raw: impl Into<String>) -> Self {
        self.proxy_raw = proxy_raw.into();
        self
    }

    pub fn with_metadata(mut self, isp: impl Into<String>, dns: impl Into<String>) -> Self {
        self.isp = isp.into();
        self.dns = dns.into();
        self
    }
}

/// Binary verdict of a probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Success,
    Fail,
}

impl Verdict {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(Self::Success),
            "FAIL" => Some(Self::Fail),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// The durable result of one domain's full retry sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub domain: String,
    pub isp: String,
    pub dns: String,

    /// Reported HTTP status, empty when no attempt produced one
    pub status_http: String,

    pub status_final: Verdict,

    /// Title or leading text of the successful page
    pub content_snippet: String,

    pub tried_count: u32,

    /// URL used by the last attempt
    pub last_url: String,

    /// Redirect target chased (or reached) during the sequence
    pub resolved_redirect_url: Option<String>,

    /// Last transport failure seen, if any
    pub last_error: Option<TransportErrorKind>,
}

impl ProbeOutcome {
    /// A failed outcome with no attempts, for domains that cannot be probed
    pub fn invalid(target: &ProbeTarget) -> Self {
        Self {
            domain: target.domain.trim().to_string(),
            isp: target.isp.clone(),
            dns: target.dns.clone(),
            status_http: String::new(),
            status_final: Verdict::Fail,
            content_snippet: String::new(),
            tried_count: 0,
            last_url: String::new(),
            resolved_redirect_url: None,
            last_error: None,
        }
    }

    /// A failed outcome for a domain whose orchestration crashed
    pub fn errored(target: &ProbeTarget) -> Self {
        Self {
            status_http: ERROR_STATUS.to_string(),
            ..Self::invalid(target)
        }
    }

    /// The URL reported to the output sheet: the redirect target when one was
    /// resolved, otherwise the last URL tried
    pub fn reported_url(&self) -> &str {
        self.resolved_redirect_url
            .as_deref()
            .unwrap_or(self.last_url.as_str())
    }
}
