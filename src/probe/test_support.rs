//! Scripted collaborators for exercising the prober without a network

use crate::probe::executor::AttemptExecutor;
use crate::probe::orchestrator::Sleeper;
use crate::state::AttemptResult;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub proxy: Option<String>,
    pub has_headers: bool,
}

/// Replays a fixed list of results, one per call; answers 500 once exhausted
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<AttemptResult>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<AttemptResult>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.url.clone()).collect()
    }

    pub fn proxies(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|c| c.proxy.clone()).collect()
    }

    pub fn header_flags(&self) -> Vec<bool> {
        self.calls.lock().unwrap().iter().map(|c| c.has_headers).collect()
    }
}

#[async_trait]
impl AttemptExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> AttemptResult {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            proxy: proxy.map(str::to_string),
            has_headers: headers.is_some(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| AttemptResult::http(500))
    }
}

/// Records requested delays instead of sleeping
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
