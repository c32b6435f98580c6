//! In-memory page source for offline replays and tests.

use super::provider::{FetchError, PageSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Response {
    Body(String),
    Status(u16),
    Timeout,
}

/// Serves canned responses keyed by exact URL; unknown URLs answer 404.
///
/// Also counts requests and the peak number of concurrent fetches, which is
/// how the worker-pool bound is observed.
#[derive(Debug, Default)]
pub struct FixtureSource {
    responses: HashMap<String, Response>,
    latency: Duration,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Response::Body(body.into()));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, code: u16) -> Self {
        self.responses.insert(url.into(), Response::Status(code));
        self
    }

    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Response::Timeout);
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl PageSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let result = match self.responses.get(url) {
            Some(Response::Body(body)) => Ok(body.clone()),
            Some(Response::Status(code)) => Err(FetchError::Status {
                url: url.to_string(),
                code: *code,
            }),
            Some(Response::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                code: 404,
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn is_available(&self) -> bool {
        true
    }
}
