//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Maximum number of items a single list request may return.
pub const MAX_LIMIT: u64 = 100;

/// Limit/offset query parameters for paginated list endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListQuery {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    50
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ListQuery {
    /// Returns the limit for database queries, clamped to [`MAX_LIMIT`].
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.min(MAX_LIMIT)
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.limit(), 50);
        assert_eq!(query.offset(), 0);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(100, 100)]
    #[case(101, 100)]
    #[case(5000, 100)]
    fn test_limit_clamped(#[case] requested: u64, #[case] expected: u64) {
        let query = ListQuery {
            limit: requested,
            offset: 0,
        };
        assert_eq!(query.limit(), expected);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }
}
