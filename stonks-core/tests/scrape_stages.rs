//! Integration tests for the three scrape stages against recorded page fixtures.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use stonks_core::domain::PeRatio;
use stonks_core::scrape::{DetailFailure, DetailFetcher, ListingFetcher, RateError, RateFetcher};
use stonks_core::source::FixtureSource;

const BASE: &str = "https://markets.test";
const RATES: &str = "https://rates.test/XML_daily.asp";
const LISTING_TEMPLATE: &str = "/index/components/s&p_500?p={page}";

fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()))
}

fn source() -> FixtureSource {
    FixtureSource::new()
        .with_page(RATES, fixture("daily_rates.xml"))
        .with_page(
            format!("{BASE}/index/components/s&p_500?p=1"),
            fixture("listing_page1.html"),
        )
        .with_page(format!("{BASE}/stocks/aapl-stock"), fixture("detail_aapl.html"))
        .with_page(
            format!("{BASE}/stocks/bnc-stock"),
            fixture("detail_no_identifiers.html"),
        )
}

#[test]
fn rate_fixture_yields_usd() {
    let src = source();
    let rate = RateFetcher::new(&src, RATES, "R01235").fetch().unwrap();
    assert_eq!(rate.value, Decimal::from(90));
    assert_eq!(rate.as_of.map(|d| d.to_string()), Some("2026-10-17".into()));
}

#[test]
fn rate_for_unknown_currency_is_fatal() {
    let src = source();
    let err = RateFetcher::new(&src, RATES, "R00000").fetch().unwrap_err();
    assert!(matches!(err, RateError::DataUnavailable(_)));
}

#[test]
fn listing_fixture_yields_three_references() {
    let src = source();
    let listing = ListingFetcher::new(&src, BASE, LISTING_TEMPLATE).unwrap();
    let page = listing.fetch_page(1).unwrap();

    assert_eq!(page.row_count(), 4);
    let refs: Vec<_> = page.references().collect();
    let summary: Vec<(&str, &str, f64)> = refs
        .iter()
        .map(|r| (r.code.as_str(), r.url.as_str(), r.growth))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("3M", "https://markets.test/stocks/mmm-stock", 11.35),
            ("Apple", "https://markets.test/stocks/aapl-stock", 48.2),
            ("Brand New Co", "https://markets.test/stocks/bnc-stock", 0.0),
        ]
    );
}

#[test]
fn detail_fixture_parses_and_converts() {
    let src = source();
    let rate = RateFetcher::new(&src, RATES, "R01235").fetch().unwrap();
    let listing = ListingFetcher::new(&src, BASE, LISTING_TEMPLATE).unwrap();
    let page = listing.fetch_page(1).unwrap();
    let apple = page.references().find(|r| r.code == "Apple").unwrap();

    let parsed = DetailFetcher::new(&src, &rate).fetch(&apple).unwrap();
    let record = parsed.record;
    assert_eq!(record.name, "Apple");
    assert!(record.code.starts_with("AAPL"));
    assert_eq!(record.price, Decimal::from_str("106653.6").unwrap());
    assert_eq!(record.pe, PeRatio::Value(Decimal::from_str("30.18").unwrap()));
    assert_eq!(record.growth, 48.2);

    let profit = record.potential_profit.to_f64().unwrap();
    assert!((profit - 21.660165).abs() < 1e-4, "profit {profit}");
    assert!(parsed.anomalies.is_empty());
}

#[test]
fn page_without_identifiers_is_dropped() {
    let src = source();
    let rate = RateFetcher::new(&src, RATES, "R01235").fetch().unwrap();
    let listing = ListingFetcher::new(&src, BASE, LISTING_TEMPLATE).unwrap();
    let page = listing.fetch_page(1).unwrap();
    let bnc = page.references().find(|r| r.code == "Brand New Co").unwrap();

    let res = DetailFetcher::new(&src, &rate).fetch(&bnc);
    assert!(matches!(res, Err(DetailFailure::MissingIdentifiers)));
}

#[test]
fn unlisted_detail_page_is_a_fetch_failure() {
    let src = source();
    let rate = RateFetcher::new(&src, RATES, "R01235").fetch().unwrap();
    let listing = ListingFetcher::new(&src, BASE, LISTING_TEMPLATE).unwrap();
    let page = listing.fetch_page(1).unwrap();
    let mmm = page.references().find(|r| r.code == "3M").unwrap();

    let res = DetailFetcher::new(&src, &rate).fetch(&mmm);
    assert!(matches!(res, Err(DetailFailure::Fetch(_))));
}
