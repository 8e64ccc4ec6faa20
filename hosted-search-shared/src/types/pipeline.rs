//! Aggregation pipeline types.
//!
//! A pipeline is an ordered sequence of stages. Each stage is a single-key
//! mapping from a stage name (`$search`, `$limit`, `$sort`, ...) to a stage
//! body. These are the generic document types used at the serialization
//! boundary; the pipeline core builds typed views on top of them.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generic JSON document with insertion-ordered keys.
pub type Document = Map<String, Value>;

/// Name of the full-text search stage. It must be the first stage of a pipeline.
pub const SEARCH_STAGE_NAME: &str = "$search";

/// Name of the stage returning only search metadata (counts, facet buckets).
pub const SEARCH_META_STAGE_NAME: &str = "$searchMeta";

/// Name of the page size stage.
pub const LIMIT_STAGE_NAME: &str = "$limit";

/// Name of the sort stage.
pub const SORT_STAGE_NAME: &str = "$sort";

/// Placeholder replaced by the user's search text when a pipeline is assembled.
pub const SEARCH_QUERY_VARIABLE: &str = "$$SEARCH_QUERY";

/// A single pipeline stage: `{ <name>: <body> }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    name: String,
    body: Value,
}

impl Stage {
    /// Create a stage from its name and body.
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    /// Create a `{ $limit: size }` stage.
    pub fn limit(size: u64) -> Self {
        Self::new(LIMIT_STAGE_NAME, Value::from(size))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Value {
        &mut self.body
    }

    /// Returns true if this stage is keyed by `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.body)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Document::deserialize(deserializer)?;
        if document.len() != 1 {
            return Err(de::Error::custom(format!(
                "pipeline stage must have exactly one key, found {}",
                document.len()
            )));
        }

        document
            .into_iter()
            .next()
            .map(|(name, body)| Self { name, body })
            .ok_or_else(|| de::Error::custom("pipeline stage is empty"))
    }
}

/// An ordered sequence of pipeline stages.
///
/// Serializes as a plain JSON array of single-key stage documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create a pipeline from its stages.
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut Vec<Stage> {
        &mut self.stages
    }

    /// Returns the first stage, if any.
    pub fn first(&self) -> Option<&Stage> {
        self.stages.first()
    }

    /// Returns the index of the first stage keyed by `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|stage| stage.is_named(name))
    }

    /// Returns the number of stages keyed by `name`.
    pub fn count_stages(&self, name: &str) -> usize {
        self.stages.iter().filter(|stage| stage.is_named(name)).count()
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl From<Vec<Stage>> for Pipeline {
    fn from(stages: Vec<Stage>) -> Self {
        Self::new(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_deserializes_stages_in_order() {
        let pipeline: Pipeline = serde_json::from_value(json!([
            { "$search": { "index": "default", "text": { "query": "loft", "path": "name" } } },
            { "$limit": 10 }
        ]))
        .unwrap();

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.stages()[0].name(), SEARCH_STAGE_NAME);
        assert_eq!(pipeline.stages()[1], Stage::limit(10));
        assert_eq!(pipeline.position(LIMIT_STAGE_NAME), Some(1));
    }

    #[test]
    fn test_stage_with_two_keys_is_rejected() {
        let result: Result<Pipeline, _> =
            serde_json::from_value(json!([{ "$search": {}, "$limit": 10 }]));
        assert!(result.is_err());

        let result: Result<Pipeline, _> = serde_json::from_value(json!([{}]));
        assert!(result.is_err());
    }

    #[test]
    fn test_pipeline_serializes_as_array_of_stages() {
        let pipeline = Pipeline::new(vec![
            Stage::new(SEARCH_STAGE_NAME, json!({ "text": { "query": "beach" } })),
            Stage::limit(5),
        ]);

        assert_eq!(
            serde_json::to_value(&pipeline).unwrap(),
            json!([{ "$search": { "text": { "query": "beach" } } }, { "$limit": 5 }])
        );
    }

    #[test]
    fn test_count_stages() {
        let pipeline = Pipeline::new(vec![Stage::limit(5), Stage::limit(10)]);
        assert_eq!(pipeline.count_stages(LIMIT_STAGE_NAME), 2);
        assert_eq!(pipeline.count_stages(SORT_STAGE_NAME), 0);
    }
}
