//! Page source trait and fetch errors.
//!
//! Every stage fetches through `PageSource`, so the HTTP client can be
//! replaced by recorded fixtures in tests and offline replays.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {code} for {url}")]
    Status { url: String, code: u16 },

    #[error("rate limited fetching {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("site has blocked requests (circuit breaker open)")]
    CircuitOpen,

    #[error("unreadable body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::RateLimited { .. } => true,
            FetchError::Status { code, .. } => *code >= 500,
            FetchError::CircuitOpen | FetchError::Body { .. } | FetchError::Client(_) => false,
        }
    }
}

/// Something that can GET a URL and return its text body.
pub trait PageSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// False while the source refuses requests (e.g. breaker open).
    fn is_available(&self) -> bool;
}
