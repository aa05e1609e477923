//! Page cursor for the paginated profile search.

use serde::{Deserialize, Serialize};

/// Largest page size the client will request.
const MAX_PAGE_SIZE: usize = 100;

/// A 1-based page number plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u32,
    /// Number of items per page.
    pub limit: usize,
}

impl PageRequest {
    /// Create a new page request, clamping both values into range.
    pub fn new(page: u32, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The first page with the given size.
    pub fn first(limit: usize) -> Self {
        Self::new(1, limit)
    }

    /// The page after this one.
    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.limit)
    }

    /// A returned page shorter than the limit marks the end of the results.
    pub fn is_last_page(&self, returned: usize) -> bool {
        returned < self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 1);
        assert_eq!(PageRequest::new(3, 1000).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_last_page_detection() {
        let req = PageRequest::first(9);
        assert!(!req.is_last_page(9));
        assert!(req.is_last_page(4));
        assert!(req.is_last_page(0));
        assert_eq!(req.next().page, 2);
    }
}
