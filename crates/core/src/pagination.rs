//! Page arithmetic for listing endpoints.
//!
//! The calculator never touches the database: callers fetch one page of items
//! using [`Page::skip`] / [`Page::page_size`] together with the total count, then
//! ask [`Page::is_out_of_range`] whether the served slice should instead become a
//! redirect to [`Page::last_page`].

use std::num::NonZeroU64;

/// Stores shown per listing page.
pub const STORES_PER_PAGE: NonZeroU64 = NonZeroU64::new(4).expect("page size is non-zero");

/// Result of [`paginate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page actually served.
    pub effective_page: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Items to bypass before this page begins.
    pub skip: u64,
    /// Total number of pages, `ceil(total_count / page_size)`.
    pub total_pages: u64,
    /// Total number of items across all pages.
    pub total_count: u64,
}

impl Page {
    /// Whether the served slice is empty past the first page.
    ///
    /// Page 1 is never out of range, even with zero items.
    #[must_use]
    pub const fn is_out_of_range(&self, items_on_page: usize) -> bool {
        items_on_page == 0 && self.skip > 0
    }

    /// Page to redirect to when the requested page is out of range.
    ///
    /// This is `total_pages`, clamped to 1 so an empty collection still has a
    /// valid landing page.
    #[must_use]
    pub fn last_page(&self) -> u64 {
        self.total_pages.max(1)
    }

    /// Whether a page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.effective_page < self.total_pages
    }

    /// Whether a page precedes this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.effective_page > 1
    }
}

/// Compute skip offset and page count for a listing request.
///
/// `requested_page` is treated as 1 when absent or non-positive.
#[must_use]
pub fn paginate(requested_page: Option<i64>, page_size: NonZeroU64, total_count: u64) -> Page {
    let effective_page = requested_page
        .and_then(|p| u64::try_from(p).ok())
        .filter(|&p| p > 0)
        .unwrap_or(1);
    let page_size = page_size.get();

    Page {
        effective_page,
        page_size,
        skip: (effective_page - 1).saturating_mul(page_size),
        total_pages: total_count.div_ceil(page_size),
        total_count,
    }
}

/// Parse a page path segment leniently; anything unparseable counts as absent.
#[must_use]
pub fn parse_page_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap_or(NonZeroU64::MIN)
    }

    #[test]
    fn test_first_page_defaults() {
        let page = paginate(None, STORES_PER_PAGE, 10);
        assert_eq!(page.effective_page, 1);
        assert_eq!(page.skip, 0);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_non_positive_page_treated_as_first() {
        assert_eq!(paginate(Some(0), STORES_PER_PAGE, 10).effective_page, 1);
        assert_eq!(paginate(Some(-5), STORES_PER_PAGE, 10).skip, 0);
    }

    #[test]
    fn test_skip_for_later_pages() {
        let page = paginate(Some(3), STORES_PER_PAGE, 100);
        assert_eq!(page.skip, 8);
        assert_eq!(page.effective_page, 3);
        assert_eq!(page.total_pages, 25);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for total in 0..50_u64 {
            for n in 1..7_u64 {
                let page = paginate(Some(2), size(n), total);
                assert_eq!(page.total_pages, total.div_ceil(n));
                assert_eq!(page.skip, (page.effective_page - 1) * n);
            }
        }
    }

    #[test]
    fn test_page_past_end_is_out_of_range() {
        let page = paginate(Some(3), STORES_PER_PAGE, 4);
        assert_eq!(page.skip, 8);
        assert!(page.is_out_of_range(0));
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_empty_first_page_is_not_out_of_range() {
        let page = paginate(Some(1), STORES_PER_PAGE, 0);
        assert!(!page.is_out_of_range(0));
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_empty_later_page_redirects_to_page_one() {
        let page = paginate(Some(2), STORES_PER_PAGE, 0);
        assert!(page.is_out_of_range(0));
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_page_with_items_is_in_range() {
        let page = paginate(Some(2), STORES_PER_PAGE, 6);
        assert!(!page.is_out_of_range(2));
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let page = paginate(Some(i64::MAX), STORES_PER_PAGE, 1);
        assert_eq!(page.skip, u64::MAX);
    }

    #[test]
    fn test_parse_page_param() {
        assert_eq!(parse_page_param(Some("4")), Some(4));
        assert_eq!(parse_page_param(Some("abc")), None);
        assert_eq!(parse_page_param(None), None);
    }
}
