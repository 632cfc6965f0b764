//! Field value reconciliation
//!
//! Matches a source item's field values against the destination project's
//! schema and produces the updates to issue. Single-select option names are
//! resolved to destination option ids; iteration ids go through the static
//! remap table from the configuration. Values with no destination
//! counterpart are skipped with a warning, never defaulted.

use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::fields::{FieldKind, FieldSchema, FieldValue, ItemFieldValues, ProjectField};

/// A resolved update, ready to send as a field mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Set a single-select field to the option with this id
    SingleSelectOption(String),
    /// Set an iteration field to the iteration with this id
    Iteration(String),
}

impl FieldUpdate {
    /// The `ProjectV2FieldValue` variant payload for the update mutation
    pub fn payload(&self) -> Value {
        match self {
            FieldUpdate::SingleSelectOption(id) => json!({ "singleSelectOptionId": id }),
            FieldUpdate::Iteration(id) => json!({ "iterationId": id }),
        }
    }
}

/// Resolve one source value against one destination field
///
/// Returns `None` when the value has no destination counterpart (unknown
/// option name, unmapped iteration id) or the field kind has no replay path.
pub fn resolve_update(
    field: &ProjectField,
    value: &FieldValue,
    iteration_map: &HashMap<String, String>,
) -> Option<FieldUpdate> {
    match (&field.kind, value) {
        (FieldKind::SingleSelect { options }, FieldValue::SingleSelect { option }) => {
            match options.get(option) {
                Some(option_id) => Some(FieldUpdate::SingleSelectOption(option_id.clone())),
                None => {
                    warn!(
                        field = %field.name,
                        option = %option,
                        "No matching option in destination project, skipping"
                    );
                    None
                }
            }
        }
        (FieldKind::Iteration { .. }, FieldValue::Iteration { iteration_id }) => {
            match iteration_map.get(iteration_id) {
                Some(mapped) => Some(FieldUpdate::Iteration(mapped.clone())),
                None => {
                    warn!(
                        field = %field.name,
                        iteration_id = %iteration_id,
                        "No mapping for source iteration id, skipping"
                    );
                    None
                }
            }
        }
        // Plain fields have no replay path; mismatched shapes are dropped.
        (FieldKind::Plain, _) => None,
        (_, value) => {
            debug!(
                field = %field.name,
                ?value,
                "Source value does not match destination field shape"
            );
            None
        }
    }
}

/// An update planned against a specific destination field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub field_id: String,
    pub field_name: String,
    pub update: FieldUpdate,
}

/// Plan all updates for one item
///
/// Walks every destination field whose name also appears in the source
/// values and keeps the ones that resolve to a destination id.
pub fn plan_updates(
    schema: &FieldSchema,
    source: &ItemFieldValues,
    iteration_map: &HashMap<String, String>,
) -> Vec<PlannedUpdate> {
    let mut planned = Vec::new();

    for (name, field) in schema {
        let Some(value) = source.get(name) else {
            continue;
        };

        if let Some(update) = resolve_update(field, value, iteration_map) {
            planned.push(PlannedUpdate {
                field_id: field.id.clone(),
                field_name: name.clone(),
                update,
            });
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::fields::Iteration;

    fn select_field(name: &str, options: &[(&str, &str)]) -> ProjectField {
        ProjectField {
            id: format!("F_{}", name.to_lowercase()),
            name: name.to_string(),
            kind: FieldKind::SingleSelect {
                options: options
                    .iter()
                    .map(|(n, id)| (n.to_string(), id.to_string()))
                    .collect(),
            },
        }
    }

    fn iteration_field(name: &str) -> ProjectField {
        let mut iterations = HashMap::new();
        iterations.insert(
            "Sprint 1".to_string(),
            Iteration {
                id: "7f367449".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            },
        );
        ProjectField {
            id: format!("F_{}", name.to_lowercase()),
            name: name.to_string(),
            kind: FieldKind::Iteration { iterations },
        }
    }

    fn remap() -> HashMap<String, String> {
        HashMap::from([("ea0f6749".to_string(), "7f367449".to_string())])
    }

    #[test]
    fn test_single_select_resolves_option_id() {
        let field = select_field("Status", &[("In Progress", "OPT_1"), ("Done", "OPT_2")]);
        let value = FieldValue::SingleSelect {
            option: "In Progress".to_string(),
        };

        assert_eq!(
            resolve_update(&field, &value, &remap()),
            Some(FieldUpdate::SingleSelectOption("OPT_1".to_string()))
        );
    }

    #[test]
    fn test_single_select_unknown_option_skipped() {
        let field = select_field("Status", &[("Done", "OPT_2")]);
        let value = FieldValue::SingleSelect {
            option: "In Progress".to_string(),
        };

        assert_eq!(resolve_update(&field, &value, &remap()), None);
    }

    #[test]
    fn test_iteration_remapped() {
        let field = iteration_field("Sprint");
        let value = FieldValue::Iteration {
            iteration_id: "ea0f6749".to_string(),
        };

        assert_eq!(
            resolve_update(&field, &value, &remap()),
            Some(FieldUpdate::Iteration("7f367449".to_string()))
        );
    }

    #[test]
    fn test_iteration_unmapped_skipped() {
        let field = iteration_field("Sprint");
        let value = FieldValue::Iteration {
            iteration_id: "deadbeef".to_string(),
        };

        assert_eq!(resolve_update(&field, &value, &remap()), None);
    }

    #[test]
    fn test_plain_field_not_replayed() {
        let field = ProjectField {
            id: "F_notes".to_string(),
            name: "Notes".to_string(),
            kind: FieldKind::Plain,
        };

        assert_eq!(
            resolve_update(&field, &FieldValue::Text("hello".to_string()), &remap()),
            None
        );
        assert_eq!(
            resolve_update(&field, &FieldValue::Number(3.0), &remap()),
            None
        );
    }

    #[test]
    fn test_update_payloads() {
        assert_eq!(
            FieldUpdate::SingleSelectOption("OPT_1".to_string()).payload(),
            serde_json::json!({"singleSelectOptionId": "OPT_1"})
        );
        assert_eq!(
            FieldUpdate::Iteration("7f367449".to_string()).payload(),
            serde_json::json!({"iterationId": "7f367449"})
        );
    }

    #[test]
    fn test_plan_updates_for_issue_copy() {
        // An issue with Status="In Progress" and a mapped sprint, against a
        // destination schema that also carries fields the source never set.
        let mut schema = FieldSchema::new();
        let status = select_field("Status", &[("In Progress", "OPT_1")]);
        let sprint = iteration_field("Sprint");
        let priority = select_field("Priority", &[("High", "OPT_9")]);
        schema.insert(status.name.clone(), status);
        schema.insert(sprint.name.clone(), sprint);
        schema.insert(priority.name.clone(), priority);

        let mut source = ItemFieldValues::new();
        source.insert(
            "Status".to_string(),
            FieldValue::SingleSelect {
                option: "In Progress".to_string(),
            },
        );
        source.insert(
            "Sprint".to_string(),
            FieldValue::Iteration {
                iteration_id: "ea0f6749".to_string(),
            },
        );

        let planned = plan_updates(&schema, &source, &remap());

        assert_eq!(planned.len(), 2);
        assert!(planned.iter().any(|p| p.field_name == "Status"
            && p.update == FieldUpdate::SingleSelectOption("OPT_1".to_string())));
        assert!(planned.iter().any(|p| p.field_name == "Sprint"
            && p.update == FieldUpdate::Iteration("7f367449".to_string())));
    }
}
