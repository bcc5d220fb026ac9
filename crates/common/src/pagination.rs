//! Page-number pagination helpers
//!
//! List queries take a 1-based page number and a page size; the effective
//! values are clamped (page >= 1, limit in [1, 100]) and an out-of-range
//! page yields an empty page rather than an error.

use serde::{Deserialize, Serialize};

/// Maximum items per page
pub const MAX_PAGE_SIZE: u64 = 100;

/// A clamped page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Clamp raw page/limit arguments into their valid ranges
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.max(1) as u64;
        let limit = limit.clamp(1, MAX_PAGE_SIZE as i64) as u64;
        Self { page, limit }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Zero-based page index (for paginator-style APIs)
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }
}

/// Derived pagination info returned alongside a page of items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    /// Compute pagination info from a clamped request and a total count
    pub fn compute(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.limit);
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamped_to_one() {
        for page in [-5, 0, 1] {
            assert_eq!(PageRequest::new(page, 10).page, 1);
        }
        assert_eq!(PageRequest::new(3, 10).page, 3);
    }

    #[test]
    fn test_limit_clamped_into_range() {
        assert_eq!(PageRequest::new(1, 0).limit, 1);
        assert_eq!(PageRequest::new(1, -7).limit, 1);
        assert_eq!(PageRequest::new(1, 100).limit, 100);
        assert_eq!(PageRequest::new(1, 101).limit, 100);
        assert_eq!(PageRequest::new(1, 42).limit, 42);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        let info = PageInfo::compute(PageRequest::new(1, 10), 25);
        assert_eq!(info.total_pages, 3);

        let info = PageInfo::compute(PageRequest::new(1, 10), 30);
        assert_eq!(info.total_pages, 3);

        let info = PageInfo::compute(PageRequest::new(1, 10), 0);
        assert_eq!(info.total_pages, 0);
    }

    #[test]
    fn test_next_and_prev_flags() {
        let info = PageInfo::compute(PageRequest::new(1, 10), 25);
        assert!(info.has_next_page);
        assert!(!info.has_prev_page);

        let info = PageInfo::compute(PageRequest::new(3, 10), 25);
        assert!(!info.has_next_page);
        assert!(info.has_prev_page);
    }

    #[test]
    fn test_out_of_range_page_is_empty_not_error() {
        // Page 99 of 25 items: valid request, empty page
        let request = PageRequest::new(99, 10);
        let info = PageInfo::compute(request, 25);
        assert_eq!(info.current_page, 99);
        assert!(!info.has_next_page);
        assert!(info.has_prev_page);
        assert_eq!(request.offset(), 980);
    }
}
