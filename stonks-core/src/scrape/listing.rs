//! Index listing pages.
//!
//! A page yields one `EntityReference` per data row. Rows with fewer than two
//! cells are layout noise and are skipped silently; an unparseable growth cell
//! only defaults the growth to 0 and the row still goes through.

use super::selectors as sel;
use crate::document::{DocumentLocator, HtmlDocument};
use crate::domain::EntityReference;
use crate::numeric::parse_growth;
use crate::source::{FetchError, PageSource};
use reqwest::Url;
use thiserror::Error;

pub const PAGE_PLACEHOLDER: &str = "{page}";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("listing path template '{0}' has no {{page}} placeholder")]
    Template(String),

    #[error("listing page {page} unavailable: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },
}

/// Fetches numbered listing pages built from a base URL and a `{page}` path.
pub struct ListingFetcher<'s> {
    source: &'s dyn PageSource,
    base: Url,
    path_template: String,
}

impl<'s> ListingFetcher<'s> {
    pub fn new(
        source: &'s dyn PageSource,
        base_url: &str,
        path_template: impl Into<String>,
    ) -> Result<Self, ListingError> {
        let base = Url::parse(base_url).map_err(|e| ListingError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let path_template = path_template.into();
        if !path_template.contains(PAGE_PLACEHOLDER) {
            return Err(ListingError::Template(path_template));
        }
        Ok(Self {
            source,
            base,
            path_template,
        })
    }

    pub fn page_url(&self, page: u32) -> String {
        let path = self
            .path_template
            .replace(PAGE_PLACEHOLDER, &page.to_string());
        // `path` is appended verbatim; `Url::join` would percent-encode `&`.
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    pub fn fetch_page(&self, page: u32) -> Result<ListingPage, ListingError> {
        let url = self.page_url(page);
        let body = self
            .source
            .fetch_text(&url)
            .map_err(|source| ListingError::Fetch { page, source })?;
        let listing = ListingPage::parse(page, self.base.clone(), &body);
        tracing::info!(page, rows = listing.row_count(), "listing page fetched");
        Ok(listing)
    }
}

/// One parsed listing page.
///
/// `references()` walks the rows lazily and can be called any number of times.
#[derive(Debug)]
pub struct ListingPage {
    page: u32,
    base: Url,
    doc: HtmlDocument,
}

impl ListingPage {
    pub fn parse(page: u32, base: Url, html: &str) -> Self {
        Self {
            page,
            base,
            doc: HtmlDocument::parse(html),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of table rows, including ones that will be skipped.
    pub fn row_count(&self) -> usize {
        self.doc.select_all(sel::LISTING_ROWS).len()
    }

    pub fn references(&self) -> impl Iterator<Item = EntityReference> + '_ {
        self.doc
            .select_all(sel::LISTING_ROWS)
            .into_iter()
            .filter_map(move |row| self.reference_from_row(row))
    }

    fn reference_from_row(
        &self,
        row: <HtmlDocument as DocumentLocator>::Handle<'_>,
    ) -> Option<EntityReference> {
        let doc = &self.doc;
        let cols = doc.find_all(row, sel::LISTING_CELL_TAG);
        let (first, last) = match cols.as_slice() {
            [first, .., last] => (*first, *last),
            _ => return None,
        };

        let Some(link) = doc.find_first(Some(first), sel::LISTING_LINK_TAG) else {
            tracing::warn!(page = self.page, "row without a company link skipped");
            return None;
        };
        let code = doc.text(link).trim().to_string();
        let url = match doc.attr(link, "href").map(|href| self.base.join(href)) {
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                tracing::warn!(page = self.page, code = %code, "unresolvable company link: {e}");
                return None;
            }
            None => {
                tracing::warn!(page = self.page, code = %code, "company link has no href");
                return None;
            }
        };

        let growth_text = doc.text(last);
        let (growth, defaulted) = parse_growth(&growth_text);
        if defaulted {
            tracing::warn!(
                page = self.page,
                code = %code,
                "unreadable growth '{}', using 0",
                growth_text.trim()
            );
        }

        tracing::debug!(page = self.page, code = %code, %url, growth, "listing row");
        Some(EntityReference {
            code,
            url: url.to_string(),
            growth,
        })
    }
}
