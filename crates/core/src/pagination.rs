//! Page requests and paged responses for list endpoints.

use serde::{Deserialize, Serialize};

/// A requested page, 1-based. Out-of-range values are clamped rather than
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "PageRequest::first")]
    pub page: u32,
    #[serde(default = "PageRequest::default_size")]
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::first(),
            per_page: Self::default_size(),
        }
    }
}

impl PageRequest {
    pub const MAX_PER_PAGE: u32 = 100;

    const fn first() -> u32 {
        1
    }

    const fn default_size() -> u32 {
        20
    }

    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }.clamped()
    }

    /// Page number at least 1 and page size within `1..=MAX_PER_PAGE`.
    #[must_use]
    pub const fn clamped(self) -> Self {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = if self.per_page == 0 {
            1
        } else if self.per_page > Self::MAX_PER_PAGE {
            Self::MAX_PER_PAGE
        } else {
            self.per_page
        };
        Self { page, per_page }
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.clamped().per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(self) -> i64 {
        let p = self.clamped();
        (i64::from(p.page) - 1) * i64::from(p.per_page)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let request = request.clamped();
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_out_of_range() {
        let p = PageRequest::new(0, 10_000);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, PageRequest::MAX_PER_PAGE);
    }

    #[test]
    fn test_offset() {
        let p = PageRequest::new(3, 25);
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 50);
        assert_eq!(PageRequest::default().offset(), 0);
    }
}
