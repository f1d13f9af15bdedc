//! Page, limit, and search-text state for paginated record listings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page sizes the listing UI may request.
pub const ALLOWED_PAGE_SIZES: [u32; 5] = [5, 10, 15, 20, 25];

/// Default page size for a fresh listing.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Error type for page-query operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageQueryError {
    #[error("Page size {0} is not one of the allowed sizes")]
    InvalidPageSize(u32),
    #[error("Page number must be at least 1")]
    InvalidPage,
}

/// Pagination and search state for the geozone listing.
///
/// Invariants: `page >= 1` and `limit` is one of [`ALLOWED_PAGE_SIZES`].
/// The query never points past the end of the result set once
/// [`PageQuery::clamp_to_total`] has been applied for the current total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub search_text: String,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search_text: String::new(),
        }
    }
}

impl PageQuery {
    /// Whether the text-search retrieval path should be used.
    pub fn is_search(&self) -> bool {
        !self.search_text.is_empty()
    }

    /// Sets the page number. Fails on page 0; clamping against the total
    /// happens separately once the total is known.
    pub fn set_page(&mut self, page: u32) -> Result<(), PageQueryError> {
        if page == 0 {
            return Err(PageQueryError::InvalidPage);
        }
        self.page = page;
        Ok(())
    }

    /// Sets the page size and resets to the first page.
    pub fn set_limit(&mut self, limit: u32) -> Result<(), PageQueryError> {
        if !ALLOWED_PAGE_SIZES.contains(&limit) {
            return Err(PageQueryError::InvalidPageSize(limit));
        }
        self.limit = limit;
        self.page = 1;
        Ok(())
    }

    /// Number of pages needed to hold `total` records at the current limit.
    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, self.limit)
    }

    /// Clamps the current page so it never points past the last page.
    ///
    /// Returns `true` when the page was adjusted.
    pub fn clamp_to_total(&mut self, total: u64) -> bool {
        let last = self.total_pages(total).max(1);
        if self.page > last {
            self.page = last;
            true
        } else {
            false
        }
    }
}

/// `ceil(total / limit)` as a page count. A zero limit yields zero pages.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit as u64) as u32
}
