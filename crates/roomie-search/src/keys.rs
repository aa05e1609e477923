//! Cache key builders for the profile search cache.
//!
//! A page key is the normalized filter record serialized in fixed field
//! order, followed by the page number. Every page of one filter set shares
//! the same prefix, which is what filter-set invalidation matches on.

use roomie_core::types::SearchFilters;

/// Storage key holding the page mapping.
pub const SEARCH_CACHE: &str = "searchCache";

/// Storage key holding the fetch timestamps.
pub const SEARCH_CACHE_TIMESTAMPS: &str = "searchCacheTimestamps";

fn filters_json(filters: &SearchFilters) -> String {
    // struct fields serialize in declaration order
    serde_json::to_string(&filters.normalized()).unwrap_or_default()
}

/// Prefix shared by every page of `filters`.
pub fn filter_prefix(filters: &SearchFilters) -> String {
    format!("{}|page=", filters_json(filters))
}

/// Cache key for one page of `filters`.
pub fn page_key(filters: &SearchFilters, page: u32) -> String {
    format!("{}{page}", filter_prefix(filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomie_core::types::StudyYear;

    #[test]
    fn test_equivalent_filters_share_keys() {
        let a = SearchFilters {
            location: "Pune".to_string(),
            ..Default::default()
        };
        let b = SearchFilters {
            location: "pune".to_string(),
            ..Default::default()
        };
        assert_eq!(page_key(&a, 1), page_key(&b, 1));
        assert_ne!(page_key(&a, 1), page_key(&a, 2));
    }

    #[test]
    fn test_prefix_covers_every_page_and_nothing_else() {
        let filters = SearchFilters {
            year: Some(StudyYear::First),
            ..Default::default()
        };
        let other = SearchFilters {
            year: Some(StudyYear::Second),
            ..Default::default()
        };
        let prefix = filter_prefix(&filters);
        assert!(page_key(&filters, 1).starts_with(&prefix));
        assert!(page_key(&filters, 12).starts_with(&prefix));
        assert!(!page_key(&other, 1).starts_with(&prefix));
    }

    #[test]
    fn test_key_shape() {
        let key = page_key(&SearchFilters::default(), 3);
        assert!(key.starts_with("{\"location\":\"\""));
        assert!(key.ends_with("|page=3"));
    }
}
