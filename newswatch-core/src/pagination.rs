use std::ops::RangeInclusive;

use crate::api::ArticleSource;
use crate::error::FeedError;
use crate::feed::Article;

/// Items per page served by the listing endpoint.
pub const PAGE_SIZE: u64 = 20;

/// Buttons shown by the page selector.
const WINDOW_LEN: u32 = 5;

pub fn total_pages(reported_count: u64) -> u32 {
    u32::try_from(reported_count.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX)
}

pub fn has_previous(current: u32) -> bool {
    current > 1
}

pub fn has_next(current: u32, total: u32) -> bool {
    current < total
}

/// Up to five page numbers around `current`, clamped to `1..=total`.
///
/// Returns an empty range when there are no pages.
pub fn page_window(current: u32, total: u32) -> RangeInclusive<u32> {
    let len = total.min(WINDOW_LEN);
    if len == 0 {
        return 1..=0;
    }
    let start = (i64::from(current) - 2).min(i64::from(total) - i64::from(WINDOW_LEN - 1));
    let start = u32::try_from(start.max(1)).unwrap_or(1);
    start..=start + len - 1
}

/// One fetched listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub page: u32,
    pub items: Vec<Article>,
    pub reported_count: u64,
}

impl PageResult {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.reported_count)
    }
}

#[derive(Debug, Clone)]
pub struct PaginationController<S> {
    source: S,
}

impl<S: ArticleSource> PaginationController<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Requests exactly one page. No retries; that policy belongs to the caller.
    pub async fn fetch_page(&self, page: u32) -> Result<PageResult, FeedError> {
        if page == 0 {
            return Err(FeedError::InvalidPage(page));
        }
        let response = self.source.fetch_page(page).await?;
        Ok(PageResult {
            page,
            items: response.results,
            reported_count: response.count,
        })
    }
}
