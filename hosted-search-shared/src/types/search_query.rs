//! Sort request types.
//!
//! A missing sort request means the search engine's default relevance ordering.

use serde::{Deserialize, Serialize};

/// Direction of a sort request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the `$sort` stage value for this direction: `1` or `-1`.
    pub fn sign(&self) -> i64 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// Sort the result documents by a single field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortRequest {
    /// Field path to sort by.
    pub path: String,
    pub direction: SortDirection,
}

impl SortRequest {
    pub fn ascending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn descending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_request_serde() {
        let sort: SortRequest =
            serde_json::from_value(json!({ "path": "beds", "direction": "DESC" })).unwrap();
        assert_eq!(sort, SortRequest::descending("beds"));
        assert_eq!(sort.direction.sign(), -1);

        let sort: SortRequest =
            serde_json::from_value(json!({ "path": "beds", "direction": "ASC" })).unwrap();
        assert_eq!(sort.direction.sign(), 1);
    }

    #[test]
    fn test_lowercase_direction_is_rejected() {
        let result: Result<SortRequest, _> =
            serde_json::from_value(json!({ "path": "beds", "direction": "desc" }));
        assert!(result.is_err());
    }
}
