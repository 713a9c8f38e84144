//! Page-number pagination for list endpoints.
//!
//! Pages are 1-based. A request is validated once at construction so the
//! repository layer can use [`PageRequest::offset`] and
//! [`PageRequest::limit`] without further checks.

use crate::error::CoreError;

/// Page used when the caller does not supply one.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A validated `(page, page_size)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
    offset: i64,
}

impl PageRequest {
    /// Build a page request, applying defaults for missing values.
    ///
    /// Fails with [`CoreError::Validation`] when either value is below 1 or
    /// the resulting row offset does not fit in an `i64`.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, CoreError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(CoreError::Validation(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if page_size < 1 {
            return Err(CoreError::Validation(format!(
                "pageSize must be at least 1, got {page_size}"
            )));
        }

        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            CoreError::Validation("page and pageSize are too large".to_string())
        })?;

        Ok(Self {
            page,
            page_size,
            offset,
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Maximum number of rows to return.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Number of pages needed to show `total_count` rows at this page size.
    pub fn total_pages(&self, total_count: i64) -> i64 {
        total_pages(total_count, self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// `ceil(total_count / page_size)`, or 0 for an empty result.
///
/// `page_size` must be positive.
pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count <= 0 {
        return 0;
    }
    let full = total_count / page_size;
    if total_count % page_size == 0 {
        full
    } else {
        full + 1
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_apply_when_missing() {
        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 10);
        assert_eq!(req.offset(), 0);
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn offset_skips_previous_pages() {
        let req = PageRequest::new(Some(3), Some(25)).unwrap();
        assert_eq!(req.offset(), 50);
        assert_eq!(req.limit(), 25);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert_matches!(
            PageRequest::new(Some(1), Some(0)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn negative_page_is_rejected() {
        assert_matches!(
            PageRequest::new(Some(-2), Some(10)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            PageRequest::new(Some(0), Some(10)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn overflowing_offset_is_rejected() {
        assert_matches!(
            PageRequest::new(Some(i64::MAX), Some(i64::MAX)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(7, 3), 3);
    }

    #[test]
    fn total_pages_handles_large_counts() {
        assert_eq!(total_pages(i64::MAX, 1), i64::MAX);
        assert_eq!(total_pages(i64::MAX, i64::MAX), 1);
    }
}
