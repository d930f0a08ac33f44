//! Canned `PageFetcher` for tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use hashbrown::HashMap;

use crate::crawler::{FetchError, FetchRequest, PageFetcher};

#[derive(Clone)]
enum Reply {
    Page(String),
    Status(u16),
    Transport(String),
}

/// What the stub observed, shared with the test after the fetcher is moved away.
#[derive(Clone, Default)]
pub struct Calls {
    total: Arc<AtomicUsize>,
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were running at the same instant.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }
}

/// Replies by exact url; unknown urls get a transport error.
#[derive(Default)]
pub struct StubFetcher {
    replies: HashMap<String, Reply>,
    latency: Duration,
    calls: Calls,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.replies.insert(url.to_string(), Reply::Page(html.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.replies.insert(url.to_string(), Reply::Status(status));
        self
    }

    pub fn transport_error(mut self, url: &str, reason: &str) -> Self {
        self.replies
            .insert(url.to_string(), Reply::Transport(reason.to_string()));
        self
    }

    /// Every fetch sleeps this long while counted as in flight.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let calls = &self.calls;
        calls.total.fetch_add(1, Ordering::SeqCst);
        calls
            .user_agents
            .lock()
            .unwrap()
            .push(request.user_agent.clone());
        let now = calls.current.fetch_add(1, Ordering::SeqCst) + 1;
        calls.peak.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        calls.current.fetch_sub(1, Ordering::SeqCst);

        let url = request.url.to_string();
        match self.replies.get(&url).cloned() {
            Some(Reply::Page(html)) => Ok(html),
            Some(Reply::Status(status)) => Err(FetchError::Status { url, status }),
            Some(Reply::Transport(reason)) => Err(FetchError::Transport { url, reason }),
            None => Err(FetchError::Transport {
                url,
                reason: "connection refused".to_string(),
            }),
        }
    }
}
