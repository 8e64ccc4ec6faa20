//! Design definition types.
//!
//! A design definition is the user-authored configuration of a hosted search
//! page: which search index to query, the pipeline template, the declared
//! filters and sort fields, and how result documents are rendered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::RangeFilterSpec;
use super::pipeline::{Document, Pipeline};

/// Placeholder in `ui.url.template` replaced by the value of `ui.url.docFieldName`.
pub const URL_FIELD_NAME_VARIABLE: &str = "$$URL_FIELD_NAME";

/// Identity of the search index a design queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndexRef {
    /// Search index name.
    pub name: String,
    pub database_name: String,
    pub collection_name: String,
}

/// Template for a per-result link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlTemplate {
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_field_name: Option<String>,
}

/// How result documents are rendered by the Runtime pane.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UiDefinition {
    /// Document fields to render for each result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_field_names_to_render: Option<Vec<String>>,

    /// Field rendered as the title of each result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_title_field_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlTemplate>,
}

impl UiDefinition {
    /// Returns the configured URL field name, if it is non-empty.
    fn url_field_name(&self) -> Option<&str> {
        self.url
            .as_ref()
            .and_then(|url| url.doc_field_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Resolve the link for a result document.
    ///
    /// The URL-field placeholder in the template is replaced by the string form
    /// of the document's `docFieldName` value. A template without the
    /// placeholder, or a configuration without a field name, yields the template
    /// unchanged.
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The resolved URL
    /// * `None` - If no URL template is configured
    pub fn resolve_url(&self, doc: &Document) -> Option<String> {
        let url = self.url.as_ref().filter(|url| !url.template.is_empty())?;

        match self.url_field_name() {
            Some(field) if url.template.contains(URL_FIELD_NAME_VARIABLE) => {
                let value = match doc.get(field) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Some(url.template.replace(URL_FIELD_NAME_VARIABLE, &value))
            }
            _ => Some(url.template.clone()),
        }
    }

    /// Describe an inconsistent URL configuration, if any.
    ///
    /// A field name without the placeholder in the template, or the placeholder
    /// without a field name, is accepted but most likely a mistake.
    pub fn url_config_warning(&self) -> Option<String> {
        let url = self.url.as_ref()?;
        let has_placeholder = url.template.contains(URL_FIELD_NAME_VARIABLE);

        match (self.url_field_name(), has_placeholder) {
            (Some(field), false) => Some(format!(
                "URL template does not contain {} whereas docFieldName '{}' is specified",
                URL_FIELD_NAME_VARIABLE, field
            )),
            (None, true) => Some(format!(
                "URL template contains {} but docFieldName is not specified",
                URL_FIELD_NAME_VARIABLE
            )),
            _ => None,
        }
    }
}

/// User-authored configuration of a hosted search page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignDefinition {
    /// Id that uniquely identifies a stored design definition.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub search_index: SearchIndexRef,

    /// Pipeline template. Its first stage must be the `$search` stage.
    pub pipeline: Pipeline,

    /// Range filters offered to the user, in display order.
    #[serde(default)]
    pub filters: Vec<RangeFilterSpec>,

    /// Field paths the user may sort by.
    #[serde(default)]
    pub sort: Vec<String>,

    #[serde(default)]
    pub ui: UiDefinition,
}

impl DesignDefinition {
    /// Create a design definition for the given index and pipeline template.
    pub fn new(search_index: SearchIndexRef, pipeline: Pipeline) -> Self {
        Self {
            id: None,
            search_index,
            pipeline,
            filters: Vec::new(),
            sort: Vec::new(),
            ui: UiDefinition::default(),
        }
    }

    /// Set the declared range filters.
    pub fn with_filters(mut self, filters: Vec<RangeFilterSpec>) -> Self {
        self.filters = filters;
        self
    }

    /// Validate the search index identity.
    ///
    /// Pipeline structure is validated by the pipeline core, which knows the
    /// search stage shapes.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.search_index.name.trim().is_empty() {
            return Err("Specify Search Index name".to_string());
        }

        if self.search_index.database_name.trim().is_empty() {
            return Err("Specify Database name".to_string());
        }

        if self.search_index.collection_name.trim().is_empty() {
            return Err("Specify Collection name".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn airbnb_index() -> SearchIndexRef {
        SearchIndexRef {
            name: "default".to_string(),
            database_name: "sample_airbnb".to_string(),
            collection_name: "listingsAndReviews".to_string(),
        }
    }

    fn ui_with_url(template: &str, field: Option<&str>) -> UiDefinition {
        UiDefinition {
            url: Some(UrlTemplate {
                template: template.to_string(),
                doc_field_name: field.map(str::to_string),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_design_definition_deserializes() {
        let design: DesignDefinition = serde_json::from_value(json!({
            "searchIndex": {
                "name": "facets",
                "databaseName": "sample_airbnb",
                "collectionName": "listingsAndReviews"
            },
            "pipeline": [
                { "$search": { "index": "facets", "text": { "query": "$$SEARCH_QUERY", "path": "name" } } },
                { "$limit": 10 }
            ],
            "filters": [{ "type": "number_range", "path": "beds" }],
            "sort": ["beds", "bedrooms"],
            "ui": { "docFieldNamesToRender": ["name"], "docTitleFieldName": "name" }
        }))
        .unwrap();

        assert_eq!(design.search_index.name, "facets");
        assert_eq!(design.pipeline.len(), 2);
        assert_eq!(design.filters[0].key(), "number_range-beds");
        assert_eq!(design.sort, vec!["beds", "bedrooms"]);
        assert_eq!(design.ui.doc_title_field_name.as_deref(), Some("name"));
        assert!(design.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let design = DesignDefinition::new(airbnb_index(), Pipeline::default());
        assert!(design.validate().is_ok());

        let mut design = DesignDefinition::new(airbnb_index(), Pipeline::default());
        design.search_index.name = String::new();
        assert_eq!(design.validate().unwrap_err(), "Specify Search Index name");

        let mut design = DesignDefinition::new(airbnb_index(), Pipeline::default());
        design.search_index.database_name = " ".to_string();
        assert_eq!(design.validate().unwrap_err(), "Specify Database name");

        let mut design = DesignDefinition::new(airbnb_index(), Pipeline::default());
        design.search_index.collection_name = String::new();
        assert_eq!(design.validate().unwrap_err(), "Specify Collection name");
    }

    #[test]
    fn test_resolve_url_substitutes_field_value() {
        let ui = ui_with_url("https://example.com/listing/$$URL_FIELD_NAME", Some("_id"));
        let doc = json!({ "_id": "10006546", "name": "Ribeira Charming Duplex" });

        assert_eq!(
            ui.resolve_url(doc.as_object().unwrap()).as_deref(),
            Some("https://example.com/listing/10006546")
        );
        assert!(ui.url_config_warning().is_none());
    }

    #[test]
    fn test_resolve_url_with_numeric_field() {
        let ui = ui_with_url("https://example.com/?beds=$$URL_FIELD_NAME", Some("beds"));
        let doc = json!({ "beds": 2 });

        assert_eq!(
            ui.resolve_url(doc.as_object().unwrap()).as_deref(),
            Some("https://example.com/?beds=2")
        );
    }

    #[test]
    fn test_resolve_url_without_placeholder_returns_template() {
        let ui = ui_with_url("https://example.com/", Some("_id"));
        let doc = json!({ "_id": "1" });

        assert_eq!(
            ui.resolve_url(doc.as_object().unwrap()).as_deref(),
            Some("https://example.com/")
        );
        assert!(ui.url_config_warning().is_some());
    }

    #[test]
    fn test_resolve_url_placeholder_without_field_name() {
        let ui = ui_with_url("https://example.com/$$URL_FIELD_NAME", Some(""));
        let doc = json!({ "_id": "1" });

        assert_eq!(
            ui.resolve_url(doc.as_object().unwrap()).as_deref(),
            Some("https://example.com/$$URL_FIELD_NAME")
        );
        assert!(ui.url_config_warning().is_some());
    }

    #[test]
    fn test_resolve_url_without_template() {
        let doc = json!({ "_id": "1" });
        assert!(UiDefinition::default()
            .resolve_url(doc.as_object().unwrap())
            .is_none());
        assert!(ui_with_url("", None)
            .resolve_url(doc.as_object().unwrap())
            .is_none());
    }
}
