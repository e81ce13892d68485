//! Pagination metadata

use serde::{Deserialize, Serialize};

/// Where the view sits within the filtered rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub page: usize,
    /// Rows per page
    pub page_size: usize,
    /// Rows in the filtered view
    pub total: usize,
}

impl PageInfo {
    pub fn new(page: usize, page_size: usize, total: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            total,
        }
    }

    /// Total number of pages. An empty view still has one page.
    pub fn total_pages(&self) -> usize {
        total_pages(self.total, self.page_size)
    }

    /// Index of the first row of the current page
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// The page points beyond the last page, e.g. after rows were deleted
    pub fn is_past_end(&self) -> bool {
        self.page > self.total_pages()
    }

    /// Number of rows the current page shows
    pub fn visible_len(&self) -> usize {
        self.total
            .saturating_sub(self.offset())
            .min(self.page_size)
    }

    /// 1-based inclusive range of rows shown, `None` when the page is empty
    pub fn shown_range(&self) -> Option<(usize, usize)> {
        match self.visible_len() {
            0 => None,
            n => Some((self.offset() + 1, self.offset() + n)),
        }
    }
}

/// Pages needed for `total` rows, never less than one
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Clamp `page` into `[1, total_pages]`
pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(total, page_size))
}

/// One page of rows with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items for current page
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, info: PageInfo) -> Self {
        Self {
            items,
            total_pages: info.total_pages(),
            info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(PageInfo::new(1, 10, 0).offset(), 0);
        assert_eq!(PageInfo::new(2, 10, 0).offset(), 10);
        assert_eq!(PageInfo::new(3, 25, 0).offset(), 50);
    }

    #[test]
    fn clamps_page_and_size() {
        let p = PageInfo::new(0, 0, 5);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(100, 10), 10);
        assert_eq!(total_pages(101, 50), 3);
    }

    #[test]
    fn has_next_prev() {
        let p = PageInfo::new(1, 10, 30);
        assert!(p.has_next());
        assert!(!p.has_prev());

        let p = PageInfo::new(2, 10, 30);
        assert!(p.has_next());
        assert!(p.has_prev());

        let p = PageInfo::new(3, 10, 30);
        assert!(!p.has_next());
        assert!(p.has_prev());
    }

    #[test]
    fn visible_rows_and_range() {
        let p = PageInfo::new(2, 10, 12);
        assert_eq!(p.visible_len(), 2);
        assert_eq!(p.shown_range(), Some((11, 12)));
        assert!(!p.is_past_end());

        let stale = PageInfo::new(2, 10, 9);
        assert_eq!(stale.visible_len(), 0);
        assert_eq!(stale.shown_range(), None);
        assert!(stale.is_past_end());
    }

    #[test]
    fn clamp() {
        assert_eq!(clamp_page(0, 12, 10), 1);
        assert_eq!(clamp_page(2, 12, 10), 2);
        assert_eq!(clamp_page(5, 12, 10), 2);
        assert_eq!(clamp_page(3, 0, 10), 1);
    }
}
