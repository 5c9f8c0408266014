//! Offset pagination for submission listings.

use serde::Deserialize;

/// Items per page when the client does not ask for a size
pub const DEFAULT_LIMIT: u32 = 50;

/// Page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub limit: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - Page is clamped to minimum of 1
    /// - Limit is clamped to minimum of 1; there is no upper bound
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Records to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// `ceil(total / limit)`; zero when nothing is stored.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// Query parameters for `GET /submissions`.
///
/// Kept as strings so a malformed value falls back to the default instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            positive(params.page.as_deref()).unwrap_or(1),
            positive(params.limit.as_deref()).unwrap_or(DEFAULT_LIMIT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 10).offset(), 10);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(1, 0).limit, 1);
        assert_eq!(Pagination::new(1, 9999).limit, 9999);
    }

    #[test]
    fn large_limit_skips_whole_pages() {
        let p = Pagination::from(PaginationParams {
            page: Some("2".into()),
            limit: Some("1000".into()),
        });
        assert_eq!(p.offset(), 1000);
    }

    #[test]
    fn zero_page_built_directly_does_not_underflow() {
        let p = Pagination { page: 0, limit: 10 };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn params_fall_back_to_defaults() {
        let p = Pagination::from(PaginationParams {
            page: Some("abc".into()),
            limit: Some("-5".into()),
        });
        assert_eq!(p, Pagination::default());

        let p = Pagination::from(PaginationParams {
            page: Some("2".into()),
            limit: Some("10".into()),
        });
        assert_eq!(p, Pagination::new(2, 10));
    }

    #[test]
    fn total_pages() {
        let page = |total| Paginated::<()> {
            items: vec![],
            total,
            page: 1,
            limit: 10,
        };
        assert_eq!(page(0).total_pages(), 0);
        assert_eq!(page(25).total_pages(), 3);
        assert_eq!(page(100).total_pages(), 10);
    }
}
