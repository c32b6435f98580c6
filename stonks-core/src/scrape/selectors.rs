//! Markup the scrapers rely on.
//!
//! These follow the current layout of the listing site and the rate feed.
//! When either changes, this is the only file that should need editing.

// Rate feed (XML, parsed leniently as HTML so names are lowercase-insensitive)
pub const RATE_ROOT_TAG: &str = "ValCurs";
pub const RATE_DATE_ATTR: &str = "Date";
pub const RATE_DATE_FORMAT: &str = "%d.%m.%Y";
pub const RATE_QUOTE_TAG: &str = "Valute";
pub const RATE_QUOTE_ID_ATTR: &str = "ID";
pub const RATE_VALUE_TAG: &str = "Value";
pub const RATE_NOMINAL_TAG: &str = "Nominal";

// Index listing
pub const LISTING_ROWS: &str = "div.table-responsive table.table tbody tr";
pub const LISTING_CELL_TAG: &str = "td";
pub const LISTING_LINK_TAG: &str = "a";

// Detail page
pub const IDENTIFIERS_TAG: &str = "h1";
pub const IDENTIFIERS_CLASS: &str = "price-section__identifiers";
pub const NAME_CLASS: &str = "price-section__label";
pub const CODE_CLASS: &str = "price-section__category";
pub const PRICE_CLASS: &str = "price-section__current-value";
pub const VALUE_TAG: &str = "span";
pub const PE_LABEL: &str = "P/E Ratio";
pub const WEEK_LOW_LABEL: &str = "52 Week Low";
pub const WEEK_HIGH_LABEL: &str = "52 Week High";
