//! The three fetch/parse stages: conversion rate, index listing, company detail.

pub mod detail;
pub mod listing;
pub mod rate;
pub mod selectors;

pub use detail::{Anomaly, DetailFailure, DetailFetcher, ParsedDetail};
pub use listing::{ListingError, ListingFetcher, ListingPage};
pub use rate::{RateError, RateFetcher};
