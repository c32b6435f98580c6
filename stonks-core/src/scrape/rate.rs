//! Conversion-rate fetcher.
//!
//! Reads one quotation out of a daily rates document such as
//!
//! ```xml
//! <ValCurs Date="19.10.2026">
//!   <Valute ID="R01235"><Nominal>1</Nominal><Value>81,1234</Value></Valute>
//! </ValCurs>
//! ```
//!
//! Every price conversion depends on the result, so any failure here is
//! fatal to the run.

use super::selectors as sel;
use crate::document::{DocumentLocator, HtmlDocument};
use crate::domain::ConversionRate;
use crate::numeric::parse_locale_decimal;
use crate::source::{FetchError, PageSource};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate document fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("rate data unavailable: {0}")]
    DataUnavailable(String),
}

/// Fetches the daily rate document and picks one quotation by identifier.
pub struct RateFetcher<'s> {
    source: &'s dyn PageSource,
    url: String,
    currency_id: String,
}

impl<'s> RateFetcher<'s> {
    pub fn new(
        source: &'s dyn PageSource,
        url: impl Into<String>,
        currency_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            url: url.into(),
            currency_id: currency_id.into(),
        }
    }

    pub fn fetch(&self) -> Result<ConversionRate, RateError> {
        let body = self.source.fetch_text(&self.url)?;
        let doc = HtmlDocument::parse(&body);
        let rate = parse_rate_document(&doc, &self.currency_id)?;
        tracing::info!(
            currency_id = %rate.currency_id,
            as_of = ?rate.as_of,
            "conversion rate: {}",
            rate.value
        );
        Ok(rate)
    }
}

/// Extract the quotation for `currency_id`, normalized to one unit.
pub fn parse_rate_document<D: DocumentLocator>(
    doc: &D,
    currency_id: &str,
) -> Result<ConversionRate, RateError> {
    let quote = doc
        .find_by_attr(sel::RATE_QUOTE_TAG, sel::RATE_QUOTE_ID_ATTR, currency_id)
        .ok_or_else(|| {
            RateError::DataUnavailable(format!("no quotation with id '{currency_id}'"))
        })?;

    let value_text = doc
        .find_first(Some(quote), sel::RATE_VALUE_TAG)
        .map(|v| doc.text(v))
        .ok_or_else(|| {
            RateError::DataUnavailable(format!("quotation '{currency_id}' has no value"))
        })?;
    let value = parse_locale_decimal(&value_text).ok_or_else(|| {
        RateError::DataUnavailable(format!(
            "unparseable value '{}' for '{currency_id}'",
            value_text.trim()
        ))
    })?;

    let nominal = match doc.find_first(Some(quote), sel::RATE_NOMINAL_TAG) {
        None => Decimal::ONE,
        Some(n) => {
            let text = doc.text(n);
            parse_locale_decimal(&text)
                .filter(|n| *n > Decimal::ZERO)
                .ok_or_else(|| {
                    RateError::DataUnavailable(format!(
                        "invalid nominal '{}' for '{currency_id}'",
                        text.trim()
                    ))
                })?
        }
    };

    if value <= Decimal::ZERO {
        return Err(RateError::DataUnavailable(format!(
            "non-positive rate {value} for '{currency_id}'"
        )));
    }

    let mut rate = ConversionRate::new(value / nominal, currency_id);
    if let Some(as_of) = quotation_date(doc) {
        rate = rate.with_date(as_of);
    }
    Ok(rate)
}

fn quotation_date<D: DocumentLocator>(doc: &D) -> Option<NaiveDate> {
    let root = doc.find_first(None, sel::RATE_ROOT_TAG)?;
    let raw = doc.attr(root, sel::RATE_DATE_ATTR)?;
    NaiveDate::parse_from_str(raw.trim(), sel::RATE_DATE_FORMAT).ok()
}
