//! ProjectV2 field model
//!
//! The GraphQL API exposes project fields and item field values as unions
//! discriminated by `__typename`. Both are deserialized into tagged enums
//! and normalized into lookup structures keyed by field name, so the rest
//! of the crate never touches type-name strings.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// A custom field declared on a project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectField {
    /// Field node id, used in update mutations
    pub id: String,
    /// Field name as shown on the board
    pub name: String,
    /// What kind of values the field holds
    pub kind: FieldKind,
}

/// Field variants a project can declare
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Text, number, and date fields; read on the source side but never
    /// replayed
    Plain,
    /// Options keyed by option name, mapping to the option id
    SingleSelect { options: HashMap<String, String> },
    /// Iterations keyed by title
    Iteration { iterations: HashMap<String, Iteration> },
}

/// One time-boxed iteration of an iteration field
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub id: String,
    pub start_date: NaiveDate,
}

/// Project fields keyed by field name
///
/// Ordered so that replay walks fields deterministically.
pub type FieldSchema = BTreeMap<String, ProjectField>;

/// A value a source item currently holds for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Option name as shown on the board (not the option id, which is
    /// project-specific)
    SingleSelect { option: String },
    Text(String),
    Number(f64),
    /// Opaque iteration id on the source project
    Iteration { iteration_id: String },
}

/// An item's field values keyed by field name
pub type ItemFieldValues = HashMap<String, FieldValue>;

// Wire shapes for the three field fragments the schema query inlines.

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum FieldNode {
    ProjectV2Field(PlainFieldNode),
    ProjectV2SingleSelectField(SingleSelectFieldNode),
    ProjectV2IterationField(IterationFieldNode),
}

#[derive(Debug, Deserialize)]
struct PlainFieldNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SingleSelectFieldNode {
    id: String,
    name: String,
    #[serde(default)]
    options: Vec<SelectOptionNode>,
}

#[derive(Debug, Deserialize)]
struct SelectOptionNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct IterationFieldNode {
    id: String,
    name: String,
    configuration: IterationConfigurationNode,
}

#[derive(Debug, Deserialize)]
struct IterationConfigurationNode {
    #[serde(default)]
    iterations: Vec<IterationNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IterationNode {
    id: String,
    title: String,
    start_date: NaiveDate,
}

/// Normalize raw field nodes into the lookup structure
///
/// Entries that fail to deserialize (missing id or name, unexpected shape)
/// are skipped with a warning rather than failing the whole schema.
pub(crate) fn normalize_fields(nodes: &[Value]) -> FieldSchema {
    let mut schema = FieldSchema::new();

    for node in nodes {
        let parsed = match serde_json::from_value::<FieldNode>(node.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, field = %node, "Skipping malformed project field");
                continue;
            }
        };

        let field = match parsed {
            FieldNode::ProjectV2Field(f) => ProjectField {
                id: f.id,
                name: f.name,
                kind: FieldKind::Plain,
            },
            FieldNode::ProjectV2SingleSelectField(f) => ProjectField {
                id: f.id,
                name: f.name,
                kind: FieldKind::SingleSelect {
                    options: f.options.into_iter().map(|o| (o.name, o.id)).collect(),
                },
            },
            FieldNode::ProjectV2IterationField(f) => ProjectField {
                id: f.id,
                name: f.name,
                kind: FieldKind::Iteration {
                    iterations: f
                        .configuration
                        .iterations
                        .into_iter()
                        .map(|it| {
                            (
                                it.title,
                                Iteration {
                                    id: it.id,
                                    start_date: it.start_date,
                                },
                            )
                        })
                        .collect(),
                },
            },
        };

        schema.insert(field.name.clone(), field);
    }

    schema
}

// Wire shapes for an item's field values, queried by field name.

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum FieldValueNode {
    ProjectV2ItemFieldSingleSelectValue {
        field: Option<FieldNameRef>,
        name: Option<String>,
    },
    ProjectV2ItemFieldTextValue {
        field: Option<FieldNameRef>,
        text: Option<String>,
    },
    ProjectV2ItemFieldNumberValue {
        field: Option<FieldNameRef>,
        number: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    ProjectV2ItemFieldIterationValue {
        field: Option<FieldNameRef>,
        iteration_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct FieldNameRef {
    name: Option<String>,
}

/// Flatten an item's raw field value nodes into name -> value
///
/// Value variants the replay has no use for (labels, reviewers, ...) and
/// entries with no resolvable field name are dropped.
pub(crate) fn flatten_field_values(nodes: &[Value]) -> ItemFieldValues {
    let mut values = ItemFieldValues::new();

    for node in nodes {
        let parsed = match serde_json::from_value::<FieldValueNode>(node.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, value = %node, "Skipping malformed field value");
                continue;
            }
        };

        let (field, value) = match parsed {
            FieldValueNode::ProjectV2ItemFieldSingleSelectValue {
                field,
                name: Some(option),
            } => (field, FieldValue::SingleSelect { option }),
            FieldValueNode::ProjectV2ItemFieldTextValue {
                field,
                text: Some(text),
            } => (field, FieldValue::Text(text)),
            FieldValueNode::ProjectV2ItemFieldNumberValue {
                field,
                number: Some(number),
            } => (field, FieldValue::Number(number)),
            FieldValueNode::ProjectV2ItemFieldIterationValue {
                field,
                iteration_id: Some(iteration_id),
            } => (field, FieldValue::Iteration { iteration_id }),
            _ => continue,
        };

        let Some(name) = field.and_then(|f| f.name) else {
            continue;
        };

        values.insert(name, value);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_nodes() -> Vec<Value> {
        vec![
            json!({
                "__typename": "ProjectV2Field",
                "id": "F_title",
                "name": "Title",
                "dataType": "TITLE"
            }),
            json!({
                "__typename": "ProjectV2SingleSelectField",
                "id": "F_status",
                "name": "Status",
                "dataType": "SINGLE_SELECT",
                "options": [
                    {"id": "OPT_1", "name": "In Progress"},
                    {"id": "OPT_2", "name": "Done"}
                ]
            }),
            json!({
                "__typename": "ProjectV2IterationField",
                "id": "F_sprint",
                "name": "Sprint",
                "dataType": "ITERATION",
                "configuration": {
                    "iterations": [
                        {"id": "it_1", "title": "Sprint 1", "startDate": "2025-01-06"}
                    ]
                }
            }),
        ]
    }

    #[test]
    fn test_normalize_three_field_shapes() {
        let schema = normalize_fields(&schema_nodes());

        assert_eq!(schema.len(), 3);
        assert_eq!(schema["Title"].kind, FieldKind::Plain);

        let FieldKind::SingleSelect { options } = &schema["Status"].kind else {
            panic!("Status should be single-select");
        };
        assert_eq!(options.get("In Progress").map(String::as_str), Some("OPT_1"));

        let FieldKind::Iteration { iterations } = &schema["Sprint"].kind else {
            panic!("Sprint should be an iteration field");
        };
        let sprint = &iterations["Sprint 1"];
        assert_eq!(sprint.id, "it_1");
        assert_eq!(sprint.start_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[test]
    fn test_normalize_skips_malformed_entries() {
        let mut nodes = schema_nodes();
        nodes.push(json!({}));
        nodes.push(json!({"__typename": "ProjectV2Field", "name": "No id"}));

        let schema = normalize_fields(&nodes);
        assert_eq!(schema.len(), 3);
        assert!(!schema.contains_key("No id"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let nodes = schema_nodes();
        assert_eq!(normalize_fields(&nodes), normalize_fields(&nodes));
    }

    #[test]
    fn test_flatten_field_values() {
        let nodes = vec![
            json!({
                "__typename": "ProjectV2ItemFieldSingleSelectValue",
                "field": {"name": "Status"},
                "optionId": "OPT_1",
                "name": "In Progress"
            }),
            json!({
                "__typename": "ProjectV2ItemFieldTextValue",
                "field": {"name": "Notes"},
                "text": "ship it"
            }),
            json!({
                "__typename": "ProjectV2ItemFieldNumberValue",
                "field": {"name": "Estimate"},
                "number": 3.0
            }),
            json!({
                "__typename": "ProjectV2ItemFieldIterationValue",
                "field": {"name": "Sprint"},
                "iterationId": "ea0f6749",
                "title": "Sprint 1"
            }),
        ];

        let values = flatten_field_values(&nodes);

        assert_eq!(
            values.get("Status"),
            Some(&FieldValue::SingleSelect {
                option: "In Progress".to_string()
            })
        );
        assert_eq!(values.get("Notes"), Some(&FieldValue::Text("ship it".to_string())));
        assert_eq!(values.get("Estimate"), Some(&FieldValue::Number(3.0)));
        assert_eq!(
            values.get("Sprint"),
            Some(&FieldValue::Iteration {
                iteration_id: "ea0f6749".to_string()
            })
        );
    }

    #[test]
    fn test_flatten_drops_unknown_and_unnamed_values() {
        let nodes = vec![
            json!({
                "__typename": "ProjectV2ItemFieldLabelValue",
                "labels": {"nodes": []}
            }),
            json!({
                "__typename": "ProjectV2ItemFieldTextValue",
                "field": null,
                "text": "orphaned"
            }),
        ];

        assert!(flatten_field_values(&nodes).is_empty());
    }
}
