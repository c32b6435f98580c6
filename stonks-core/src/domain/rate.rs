use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Conversion rate from the listing currency to the target currency.
///
/// Fetched once per run and shared read-only by every detail parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRate {
    /// Target-currency units per one source-currency unit.
    pub value: Decimal,
    /// Quotation identifier the rate was read for (e.g. `R01235`).
    pub currency_id: String,
    /// Quotation date, when the rate document carries one.
    pub as_of: Option<NaiveDate>,
}

impl ConversionRate {
    /// Rate without a quotation date.
    pub fn new(value: Decimal, currency_id: impl Into<String>) -> Self {
        Self {
            value,
            currency_id: currency_id.into(),
            as_of: None,
        }
    }

    /// Attach the quotation date read from the rate document.
    pub fn with_date(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Convert an amount quoted in the source currency.
    ///
    /// `None` when the product does not fit in a `Decimal`.
    pub fn convert(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.value)
    }
}
