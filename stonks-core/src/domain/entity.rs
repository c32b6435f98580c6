//! Listed entities: references scraped from the index listing and the
//! normalized records parsed from their detail pages.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// One listing row: enough to fetch the detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReference {
    /// Display code from the listing row (anchor text).
    pub code: String,
    /// Absolute detail-page URL.
    pub url: String,
    /// Year growth percentage from the trailing column (0.0 when unparseable).
    pub growth: f64,
}

/// Price-to-earnings ratio.
///
/// `Missing` is the "infinite" sentinel: the label was absent, the value was
/// unparseable, or the value was negative. It ranks after every real value in
/// an ascending sort, so a genuine zero is never confused with absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeRatio {
    Value(Decimal),
    Missing,
}

impl PeRatio {
    /// Wrap a parsed value; negative ratios carry no ranking meaning.
    pub fn from_value(value: Decimal) -> Self {
        if value < Decimal::ZERO {
            PeRatio::Missing
        } else {
            PeRatio::Value(value)
        }
    }

    /// True for the sentinel stored when the page had no usable P/E.
    pub fn is_missing(&self) -> bool {
        matches!(self, PeRatio::Missing)
    }

    /// The ratio, if present.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            PeRatio::Value(v) => Some(*v),
            PeRatio::Missing => None,
        }
    }

    /// The ratio as a JSON-ready float; `None` for the sentinel.
    pub fn to_f64(&self) -> Option<f64> {
        self.value().and_then(|v| v.to_f64())
    }
}

impl PartialOrd for PeRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PeRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PeRatio::Value(a), PeRatio::Value(b)) => a.cmp(b),
            (PeRatio::Value(_), PeRatio::Missing) => Ordering::Less,
            (PeRatio::Missing, PeRatio::Value(_)) => Ordering::Greater,
            (PeRatio::Missing, PeRatio::Missing) => Ordering::Equal,
        }
    }
}

/// Normalized data for one listed company.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub name: String,
    pub code: String,
    /// Current price, already converted to the target currency.
    pub price: Decimal,
    pub pe: PeRatio,
    /// Upside from the 52-week low to the 52-week high, in percent.
    pub potential_profit: Decimal,
    /// Carried over from the listing row.
    pub growth: f64,
}
