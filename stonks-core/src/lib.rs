//! Stonks Core: domain types, page sources, and the scrape stages.
//!
//! This crate contains everything needed to turn web pages into records:
//! - Domain types (conversion rate, entity references, entity records, P/E sentinel)
//! - Best-effort numeric parsing that reports every defaulted value
//! - `DocumentLocator`, the lookup capability the parsers are written against
//! - Page sources: blocking HTTP with circuit breaker, in-memory fixtures
//! - Rate, listing and detail fetch/parse stages

pub mod document;
pub mod domain;
pub mod numeric;
pub mod scrape;
pub mod source;
