//! Domain types for one scrape run.

pub mod entity;
pub mod rate;

pub use entity::{EntityRecord, EntityReference, PeRatio};
pub use rate::ConversionRate;
