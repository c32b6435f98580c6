//! Where pages come from: the `PageSource` seam, the HTTP implementation
//! with its circuit breaker, and an in-memory fixture source.

pub mod circuit_breaker;
pub mod fixture;
pub mod http;
pub mod provider;

pub use circuit_breaker::CircuitBreaker;
pub use fixture::FixtureSource;
pub use http::{HttpOptions, HttpSource, DEFAULT_USER_AGENT};
pub use provider::{FetchError, PageSource};
