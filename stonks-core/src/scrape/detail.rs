//! Company detail pages.
//!
//! Produces one `EntityRecord` per page, or a `DetailFailure` when the page
//! could not be fetched, lacks the identifying section or the price, or
//! carries a price too large to convert. Missing
//! or unreadable secondary fields (P/E, 52-week range, a garbled price) never
//! drop the record; they fall back to a sentinel or zero and are listed as
//! anomalies.

use super::selectors as sel;
use crate::document::{DocumentLocator, HtmlDocument, Labelled, TextMatch};
use crate::domain::{ConversionRate, EntityRecord, EntityReference, PeRatio};
use crate::numeric::{parse_decimal_or_default, potential_profit};
use crate::source::{FetchError, PageSource};
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a detail page produced no record. Never fatal to the run.
#[derive(Debug, Error)]
pub enum DetailFailure {
    #[error("detail page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("identifying section (name/code) not found")]
    MissingIdentifiers,

    #[error("current price not found")]
    MissingPrice,

    #[error("converted price out of range for '{0}'")]
    PriceOutOfRange(String),
}

/// A field that fell back to a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// Price text was not a number; price set to 0.
    PriceDefaulted(String),
    /// No P/E label on the page.
    PeMissing,
    /// P/E label present but its value was absent, unreadable or negative.
    PeInvalid(String),
    /// 52-week low or high missing; potential profit set to 0.
    WeekRangeMissing,
    /// 52-week range too extreme to compute; potential profit set to 0.
    ProfitOutOfRange,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::PriceDefaulted(raw) => write!(f, "unreadable price '{raw}', using 0"),
            Anomaly::PeMissing => write!(f, "no P/E ratio"),
            Anomaly::PeInvalid(raw) => write!(f, "unusable P/E '{raw}'"),
            Anomaly::WeekRangeMissing => {
                write!(f, "incomplete 52-week low/high, potential profit 0")
            }
            Anomaly::ProfitOutOfRange => {
                write!(f, "52-week range out of range, potential profit 0")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDetail {
    pub record: EntityRecord,
    pub anomalies: Vec<Anomaly>,
}

/// Fetches and parses detail pages, pricing each record through one rate.
pub struct DetailFetcher<'s> {
    source: &'s dyn PageSource,
    rate: &'s ConversionRate,
}

impl<'s> DetailFetcher<'s> {
    pub fn new(source: &'s dyn PageSource, rate: &'s ConversionRate) -> Self {
        Self { source, rate }
    }

    /// Fetch and parse one reference, reporting every soft failure.
    pub fn fetch(&self, reference: &EntityReference) -> Result<ParsedDetail, DetailFailure> {
        let result = self
            .source
            .fetch_text(&reference.url)
            .map_err(DetailFailure::from)
            .and_then(|body| {
                let doc = HtmlDocument::parse(&body);
                parse_detail_document(&doc, reference, self.rate)
            });

        match &result {
            Ok(parsed) => {
                for anomaly in &parsed.anomalies {
                    tracing::warn!(
                        code = %parsed.record.code,
                        name = %parsed.record.name,
                        "{anomaly}"
                    );
                }
                tracing::info!(
                    code = %parsed.record.code,
                    name = %parsed.record.name,
                    "parsed"
                );
            }
            Err(e) => tracing::warn!(code = %reference.code, url = %reference.url, "skipped: {e}"),
        }
        result
    }
}

/// Parse a detail document into a record priced through `rate`.
pub fn parse_detail_document<D: DocumentLocator>(
    doc: &D,
    reference: &EntityReference,
    rate: &ConversionRate,
) -> Result<ParsedDetail, DetailFailure> {
    let mut anomalies = Vec::new();

    let section = doc
        .find_by_class(None, sel::IDENTIFIERS_TAG, sel::IDENTIFIERS_CLASS)
        .ok_or(DetailFailure::MissingIdentifiers)?;
    let name = doc
        .find_by_class(Some(section), sel::VALUE_TAG, sel::NAME_CLASS)
        .map(|n| doc.text(n).trim().to_string())
        .ok_or(DetailFailure::MissingIdentifiers)?;
    let code = doc
        .find_by_class(Some(section), sel::VALUE_TAG, sel::CODE_CLASS)
        .map(|n| doc.text(n).trim().to_string())
        .ok_or(DetailFailure::MissingIdentifiers)?;

    let price_text = doc
        .find_by_class(None, sel::VALUE_TAG, sel::PRICE_CLASS)
        .map(|n| doc.text(n))
        .ok_or(DetailFailure::MissingPrice)?;
    let (source_price, defaulted) = parse_decimal_or_default(&price_text);
    if defaulted {
        anomalies.push(Anomaly::PriceDefaulted(price_text.trim().to_string()));
    }
    let price = rate
        .convert(source_price)
        .ok_or_else(|| DetailFailure::PriceOutOfRange(price_text.trim().to_string()))?;

    let pe = match doc.find_after_text(TextMatch::Contains(sel::PE_LABEL), sel::VALUE_TAG) {
        Labelled::LabelMissing => {
            anomalies.push(Anomaly::PeMissing);
            PeRatio::Missing
        }
        Labelled::ValueMissing => {
            anomalies.push(Anomaly::PeInvalid(String::new()));
            PeRatio::Missing
        }
        Labelled::Found(node) => {
            let raw = doc.text(node);
            let (value, defaulted) = parse_decimal_or_default(&raw);
            let pe = if defaulted {
                PeRatio::Missing
            } else {
                PeRatio::from_value(value)
            };
            if pe.is_missing() {
                anomalies.push(Anomaly::PeInvalid(raw.trim().to_string()));
            }
            pe
        }
    };

    let low = labelled_value(doc, sel::WEEK_LOW_LABEL);
    let high = labelled_value(doc, sel::WEEK_HIGH_LABEL);
    let potential_profit = match (low, high) {
        (Some(low), Some(high)) => potential_profit(low, high).unwrap_or_else(|| {
            anomalies.push(Anomaly::ProfitOutOfRange);
            Decimal::ZERO
        }),
        _ => {
            anomalies.push(Anomaly::WeekRangeMissing);
            Decimal::ZERO
        }
    };

    Ok(ParsedDetail {
        record: EntityRecord {
            name,
            code,
            price,
            pe,
            potential_profit,
            growth: reference.growth,
        },
        anomalies,
    })
}

/// Value of the first `span` after an exactly matching label, if readable.
fn labelled_value<D: DocumentLocator>(doc: &D, label: &str) -> Option<Decimal> {
    let node = doc
        .find_after_text(TextMatch::Exact(label), sel::VALUE_TAG)
        .found()?;
    match parse_decimal_or_default(&doc.text(node)) {
        (value, false) => Some(value),
        (_, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixtureSource;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn reference(growth: f64) -> EntityReference {
        EntityReference {
            code: "AAA".into(),
            url: "https://markets.test/stocks/aaa-stock".into(),
            growth,
        }
    }

    fn page(price: &str, extra: &str) -> String {
        format!(
            r#"<html><body>
              <h1 class="price-section__identifiers">
                <span class="price-section__label"> Acme Corp. </span>
                <span class="price-section__category">AAA <span>, USD</span></span>
              </h1>
              <div class="price-section__values">
                <span class="price-section__current-value">{price}</span>
              </div>
              <div class="snapshot">{extra}</div>
            </body></html>"#
        )
    }

    const FULL: &str = r#"
        <div class="snapshot__data-item"><div class="snapshot__header">P/E Ratio</div><span>28.5</span></div>
        <div><div>52 Week Low</div><span>50</span></div>
        <div><div>52 Week High</div><span>75</span></div>
    "#;

    fn parse(html: &str, rate: Decimal, growth: f64) -> Result<ParsedDetail, DetailFailure> {
        let doc = HtmlDocument::parse(html);
        parse_detail_document(&doc, &reference(growth), &ConversionRate::new(rate, "R01235"))
    }

    #[test]
    fn complete_page() {
        let html = page(
            "10",
            r#"<div>P/E Ratio</div><span>28.5</span>
               <div>52 Week Low</div><span>50</span>
               <div>52 Week High</div><span>75</span>"#,
        );
        let parsed = parse(&html, Decimal::from(90), 12.5).unwrap();
        let r = &parsed.record;
        assert_eq!(r.name, "Acme Corp.");
        assert_eq!(r.code, "AAA , USD");
        assert_eq!(r.price, Decimal::from(900));
        assert_eq!(r.pe, PeRatio::Value(dec("28.5")));
        assert_eq!(r.potential_profit, dec("50"));
        assert_eq!(r.growth, 12.5);
        assert!(parsed.anomalies.is_empty());
    }

    #[test]
    fn thousands_separator_in_price() {
        let parsed = parse(&page("1,234.50", FULL), Decimal::ONE, 0.0).unwrap();
        assert_eq!(parsed.record.price, dec("1234.50"));
    }

    #[test]
    fn missing_identifiers_drops_record() {
        let html = r#"<html><body><h1>Acme</h1>
            <span class="price-section__current-value">10</span></body></html>"#;
        assert!(matches!(
            parse(html, Decimal::ONE, 0.0),
            Err(DetailFailure::MissingIdentifiers)
        ));
    }

    #[test]
    fn missing_code_span_drops_record() {
        let html = r#"<html><body><h1 class="price-section__identifiers">
            <span class="price-section__label">Acme</span></h1>
            <span class="price-section__current-value">10</span></body></html>"#;
        assert!(matches!(
            parse(html, Decimal::ONE, 0.0),
            Err(DetailFailure::MissingIdentifiers)
        ));
    }

    #[test]
    fn missing_price_element_drops_record() {
        let html = r#"<html><body><h1 class="price-section__identifiers">
            <span class="price-section__label">Acme</span>
            <span class="price-section__category">AAA</span></h1></body></html>"#;
        assert!(matches!(
            parse(html, Decimal::ONE, 0.0),
            Err(DetailFailure::MissingPrice)
        ));
    }

    #[test]
    fn garbled_price_defaults_to_zero_and_is_reported() {
        let parsed = parse(&page("--", FULL), Decimal::from(90), 0.0).unwrap();
        assert_eq!(parsed.record.price, Decimal::ZERO);
        assert!(parsed
            .anomalies
            .contains(&Anomaly::PriceDefaulted("--".into())));
    }

    #[test]
    fn missing_pe_label_is_sentinel() {
        let html = page(
            "10",
            r#"<div>52 Week Low</div><span>50</span><div>52 Week High</div><span>75</span>"#,
        );
        let parsed = parse(&html, Decimal::ONE, 0.0).unwrap();
        assert_eq!(parsed.record.pe, PeRatio::Missing);
        assert_eq!(parsed.anomalies, vec![Anomaly::PeMissing]);
    }

    #[test]
    fn zero_pe_is_kept_distinct_from_missing() {
        let html = page("10", r#"<div>P/E Ratio</div><span>0</span>"#);
        let parsed = parse(&html, Decimal::ONE, 0.0).unwrap();
        assert_eq!(parsed.record.pe, PeRatio::Value(Decimal::ZERO));
    }

    #[test]
    fn unreadable_pe_is_sentinel() {
        let html = page("10", r#"<div>P/E Ratio</div><span>n/a</span>"#);
        let parsed = parse(&html, Decimal::ONE, 0.0).unwrap();
        assert_eq!(parsed.record.pe, PeRatio::Missing);
        assert!(parsed.anomalies.contains(&Anomaly::PeInvalid("n/a".into())));
    }

    #[test]
    fn missing_week_high_zeroes_profit() {
        let html = page("10", r#"<div>P/E Ratio</div><span>9</span><div>52 Week Low</div><span>50</span>"#);
        let parsed = parse(&html, Decimal::ONE, 0.0).unwrap();
        assert_eq!(parsed.record.potential_profit, Decimal::ZERO);
        assert_eq!(parsed.anomalies, vec![Anomaly::WeekRangeMissing]);
    }

    #[test]
    fn zero_week_low_zeroes_profit_without_anomaly() {
        let html = page(
            "10",
            r#"<div>P/E Ratio</div><span>9</span>
               <div>52 Week Low</div><span>0</span>
               <div>52 Week High</div><span>75</span>"#,
        );
        let parsed = parse(&html, Decimal::ONE, 0.0).unwrap();
        assert_eq!(parsed.record.potential_profit, Decimal::ZERO);
        assert!(parsed.anomalies.is_empty());
    }

    #[test]
    fn price_overflowing_conversion_drops_record() {
        let parsed = parse(
            &page("79228162514264337593543950335", FULL),
            Decimal::from(90),
            0.0,
        );
        assert!(matches!(parsed, Err(DetailFailure::PriceOutOfRange(raw))
            if raw == "79228162514264337593543950335"));
    }

    #[test]
    fn extreme_week_range_zeroes_profit() {
        let html = page(
            "10",
            r#"<div>P/E Ratio</div><span>9</span>
               <div>52 Week Low</div><span>0.0000000000000000000000000001</span>
               <div>52 Week High</div><span>79228162514264337593543950335</span>"#,
        );
        let parsed = parse(&html, Decimal::from(90), 0.0).unwrap();
        assert_eq!(parsed.record.price, Decimal::from(900));
        assert_eq!(parsed.record.potential_profit, Decimal::ZERO);
        assert_eq!(parsed.anomalies, vec![Anomaly::ProfitOutOfRange]);
    }

    #[test]
    fn fetch_timeout_is_a_soft_failure() {
        let src = FixtureSource::new().with_timeout("https://markets.test/stocks/aaa-stock");
        let rate = ConversionRate::new(Decimal::ONE, "R01235");
        let res = DetailFetcher::new(&src, &rate).fetch(&reference(1.0));
        assert!(matches!(res, Err(DetailFailure::Fetch(FetchError::Timeout { .. }))));
    }

    #[test]
    fn fetches_through_source() {
        let src = FixtureSource::new()
            .with_page("https://markets.test/stocks/aaa-stock", page("2.5", FULL));
        let rate = ConversionRate::new(Decimal::from(4), "R01235");
        let parsed = DetailFetcher::new(&src, &rate).fetch(&reference(3.0)).unwrap();
        assert_eq!(parsed.record.price, Decimal::from(10));
        assert_eq!(parsed.record.growth, 3.0);
        assert_eq!(src.fetch_count(), 1);
    }
}
