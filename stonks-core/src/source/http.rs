//! Blocking HTTP page source.
//!
//! One reqwest client shared by every worker thread. Each request carries the
//! configured timeout; transient failures are retried with exponential
//! backoff up to `max_retries` (0 by default, so a failure is final), and the
//! circuit breaker stops all traffic once the site starts refusing us.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{FetchError, PageSource};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Client settings for `HttpSource`.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout covering connect, headers and body.
    pub timeout: Duration,
    pub user_agent: String,
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 0,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// `PageSource` over a blocking reqwest client with retries and a circuit breaker.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpSource {
    pub fn new(
        opts: &HttpOptions,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(opts.timeout)
            .user_agent(opts.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: opts.max_retries,
            base_delay: opts.base_delay,
        })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            self.circuit_breaker.record_failure();
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            if err.is_connect() {
                self.circuit_breaker.record_failure();
            }
            FetchError::Network {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.classify(url, e))?;
        let status = resp.status();

        if status == StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(FetchError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                url: url.to_string(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            if status.is_server_error() {
                self.circuit_breaker.record_failure();
            }
            return Err(FetchError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        self.circuit_breaker.record_success();
        Ok(body)
    }
}

impl PageSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            if !self.circuit_breaker.is_allowed() {
                return Err(FetchError::CircuitOpen);
            }

            match self.fetch_once(url) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(self.base_delay, attempt);
                    tracing::debug!(url, attempt, ?delay, "retrying after: {e}");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, saturating.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
