//! Declared range filters and their per-request selections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Kind of a user-configurable filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Numeric range with optional inclusive lower and upper bounds.
    NumberRange,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::NumberRange => "number_range",
        }
    }
}

/// A filter declared in the design definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeFilterSpec {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Field path the filter applies to.
    pub path: String,
}

impl RangeFilterSpec {
    /// Create a numeric range filter on `path`.
    pub fn number_range(path: impl Into<String>) -> Self {
        Self {
            filter_type: FilterType::NumberRange,
            path: path.into(),
        }
    }

    /// Key under which the selected value of this filter is sent: `<type>-<path>`.
    ///
    /// # Example
    ///
    /// ```
    /// use hosted_search_shared::RangeFilterSpec;
    ///
    /// assert_eq!(RangeFilterSpec::number_range("beds").key(), "number_range-beds");
    /// ```
    pub fn key(&self) -> String {
        format!("{}-{}", self.filter_type.as_str(), self.path)
    }
}

/// Bounds the user entered for a range filter. Both bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
}

impl RangeSelection {
    pub fn new(min: Option<Number>, max: Option<Number>) -> Self {
        Self { min, max }
    }

    /// Returns true if neither bound is present.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Selected range filter values keyed by filter key, in selection order.
///
/// Encoded on the wire as a list of `[filterKey, { min?, max? }]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<(String, RangeSelection)>",
    into = "Vec<(String, RangeSelection)>"
)]
pub struct SelectedFilters(IndexMap<String, RangeSelection>);

impl SelectedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selection for the filter with the given key.
    pub fn with(mut self, key: impl Into<String>, selection: RangeSelection) -> Self {
        self.0.insert(key.into(), selection);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RangeSelection> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RangeSelection)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<(String, RangeSelection)>> for SelectedFilters {
    fn from(pairs: Vec<(String, RangeSelection)>) -> Self {
        Self(pairs.into_iter().collect())
    }
}

impl From<SelectedFilters> for Vec<(String, RangeSelection)> {
    fn from(selected: SelectedFilters) -> Self {
        selected.0.into_iter().collect()
    }
}
