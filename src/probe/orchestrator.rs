//! Per-domain retry orchestration
//!
//! A domain is probed through a small state machine:
//!
//! ```text
//! Attempting(1) -> Attempting(2) -> ... -> Attempting(max_slots)
//!       |               |                        |
//!       +---------------+------> Success         +-> Fail
//! ```
//!
//! All per-domain working data lives in [`WorkingState`]; each transition is
//! [`WorkingState::advance`], a pure function of that state and the latest
//! [`AttemptResult`]. The only side effects (the request and the backoff
//! sleep) happen in [`Prober::probe`].

use crate::probe::executor::AttemptExecutor;
use crate::probe::fix_plan::{classify, is_chaseable_redirect, Failure, FixPlan};
use crate::state::{AttemptKind, AttemptResult, ProbeOutcome, ProbeTarget, TransportErrorKind, Verdict};
use crate::url::{build_candidate_urls, parse_proxy};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

/// Fixed margin added to every inter-attempt delay
pub const GRACE_MS: u64 = 5_000;

/// Suspends a domain's task between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Where a domain's probe currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// About to run the given 1-based slot
    Attempting(u32),
    Success,
    Fail,
}

/// Fixed inputs of a transition
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub domain: &'a str,
    pub slot: u32,
    pub max_redirect_chase: u32,
}

/// What the orchestrator should do after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// HTTP 200 reached; carries the extracted snippet
    Success { snippet: String },

    /// Try again (if slots remain) after the base delay plus this much
    Retry { extra_delay_ms: u64 },
}

/// Working data of one domain's retry sequence
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingState {
    pub current_url: String,

    /// None until a fix plan overrides the executor defaults
    pub current_headers: Option<HeaderMap>,

    /// Consecutive redirect hops chased so far
    pub redirect_chase_count: u32,

    /// HTTP status of slot 1; transport failures never set it
    pub first_attempt_status: Option<u16>,

    /// Most recent genuine HTTP status
    pub last_http_status: Option<u16>,

    pub resolved_redirect_url: Option<String>,

    pub last_error: Option<TransportErrorKind>,
}

impl WorkingState {
    pub fn new(first_url: impl Into<String>) -> Self {
        Self {
            current_url: first_url.into(),
            current_headers: None,
            redirect_chase_count: 0,
            first_attempt_status: None,
            last_http_status: None,
            resolved_redirect_url: None,
            last_error: None,
        }
    }

    /// Applies one attempt result and decides the next step
    pub fn advance(mut self, result: &AttemptResult, ctx: &TransitionContext<'_>) -> (Self, Step) {
        if ctx.slot == 1 {
            self.first_attempt_status = result.kind.status();
        }

        match result.kind {
            AttemptKind::Transport(kind) => {
                self.last_error = Some(kind);
                self.redirect_chase_count = 0;
                let plan = classify(Failure::transport(kind), &self.current_url, ctx.domain);
                let extra_delay_ms = plan.extra_delay_ms;
                self.adopt(plan);
                (self, Step::Retry { extra_delay_ms })
            }
            AttemptKind::Http(200) => {
                self.last_http_status = Some(200);
                if self.first_was_redirect() {
                    self.resolved_redirect_url = Some(self.current_url.clone());
                }
                let snippet = result.snippet.clone();
                (self, Step::Success { snippet })
            }
            AttemptKind::Http(status) => {
                self.last_http_status = Some(status);
                let location = result.redirect_location.as_deref();

                let plan = if is_chaseable_redirect(status, location) {
                    self.redirect_chase_count += 1;
                    if self.redirect_chase_count > ctx.max_redirect_chase {
                        tracing::debug!(
                            "Redirect chase limit reached for {} at {}",
                            ctx.domain,
                            self.current_url
                        );
                        self.redirect_chase_count = 0;
                        classify(Failure::http(status, None), &self.current_url, ctx.domain)
                    } else {
                        let plan = classify(Failure::http(status, location), &self.current_url, ctx.domain);
                        self.resolved_redirect_url = plan.next_urls.first().cloned();
                        plan
                    }
                } else {
                    self.redirect_chase_count = 0;
                    classify(Failure::http(status, None), &self.current_url, ctx.domain)
                };

                let extra_delay_ms = plan.extra_delay_ms;
                self.adopt(plan);
                (self, Step::Retry { extra_delay_ms })
            }
        }
    }

    fn adopt(&mut self, plan: FixPlan) {
        self.current_url = plan.pick_next_url(&self.current_url);
        if let Some(headers) = plan.header_override {
            self.current_headers = Some(headers);
        }
    }

    fn first_was_redirect(&self) -> bool {
        matches!(self.first_attempt_status, Some(300..=399))
    }

    /// The status reported for the whole sequence
    ///
    /// A 3xx on the first attempt always wins, even over a later 200 or the
    /// status of the final attempt. Otherwise the last genuine HTTP status is
    /// reported, or nothing when no attempt produced one.
    pub fn final_status(&self) -> String {
        if self.first_was_redirect() {
            return self
                .first_attempt_status
                .map(|s| s.to_string())
                .unwrap_or_default();
        }
        self.last_http_status
            .map(|s| s.to_string())
            .unwrap_or_default()
    }
}

/// Drives the retry state machine for one domain at a time
///
/// Holds only shared, stateless collaborators; every `probe` call owns its own
/// [`WorkingState`], so one `Prober` serves any number of concurrent domains.
pub struct Prober {
    executor: Arc<dyn AttemptExecutor>,
    sleeper: Arc<dyn Sleeper>,
    max_redirect_chase: u32,
}

impl Prober {
    pub fn new(
        executor: Arc<dyn AttemptExecutor>,
        sleeper: Arc<dyn Sleeper>,
        max_redirect_chase: u32,
    ) -> Self {
        Self {
            executor,
            sleeper,
            max_redirect_chase,
        }
    }

    /// Probes one domain through its full retry budget
    ///
    /// Never fails: every problem ends up in the returned outcome.
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let domain = target.domain.trim();
        let Some(first_url) = build_candidate_urls(domain).into_iter().next() else {
            tracing::warn!("Skipping row with empty domain");
            return ProbeOutcome::invalid(target);
        };

        let proxy = parse_proxy(&target.proxy_raw);
        let max_slots = target.max_slots.max(1);
        let base_delay_ms = target
            .max_wait_seconds
            .saturating_mul(1_000)
            .saturating_add(GRACE_MS);

        let mut state = WorkingState::new(first_url);
        let mut probe_state = ProbeState::Attempting(1);
        let mut tried = 0;
        let mut last_url = state.current_url.clone();
        let mut snippet = String::new();

        while let ProbeState::Attempting(slot) = probe_state {
            tried = slot;
            last_url = state.current_url.clone();
            tracing::info!(
                "Try slot {}/{} domain={} url={} proxy={}",
                slot,
                max_slots,
                domain,
                last_url,
                if proxy.is_some() { "YES" } else { "NO" }
            );

            let result = self
                .executor
                .execute(&state.current_url, proxy.as_deref(), state.current_headers.as_ref())
                .await;

            let ctx = TransitionContext {
                domain,
                slot,
                max_redirect_chase: self.max_redirect_chase,
            };
            let (next_state, step) = state.advance(&result, &ctx);
            state = next_state;

            probe_state = match step {
                Step::Success { snippet: extracted } => {
                    tracing::info!(
                        "[SUCCESS] domain={} status=200 words={}",
                        domain,
                        extracted.split_whitespace().count()
                    );
                    snippet = extracted;
                    ProbeState::Success
                }
                Step::Retry { extra_delay_ms } => {
                    if let AttemptKind::Transport(kind) = result.kind {
                        tracing::warn!(
                            "[FAIL] domain={} slot={}/{} url={} err={}",
                            domain,
                            slot,
                            max_slots,
                            last_url,
                            kind
                        );
                    }

                    if slot >= max_slots {
                        ProbeState::Fail
                    } else {
                        let wait = Duration::from_millis(base_delay_ms.saturating_add(extra_delay_ms));
                        tracing::debug!("Waiting {:?} before slot {} of {}", wait, slot + 1, domain);
                        self.sleeper.sleep(wait).await;
                        ProbeState::Attempting(slot + 1)
                    }
                }
            };
        }

        let status_final = if probe_state == ProbeState::Success {
            Verdict::Success
        } else {
            Verdict::Fail
        };

        ProbeOutcome {
            domain: domain.to_string(),
            isp: target.isp.clone(),
            dns: target.dns.clone(),
            status_http: state.final_status(),
            status_final,
            content_snippet: snippet,
            tried_count: tried,
            last_url,
            resolved_redirect_url: state.resolved_redirect_url,
            last_error: state.last_error,
        }
    }
}
