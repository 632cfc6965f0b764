//! ProjectV2 queries and mutations
//!
//! The query shapes mirror what the board API exposes: a project's field
//! schema, an issue's project items with their field values, a single
//! item's current values, and the attach/update mutations. Fetchers return
//! empty structures on failure so the jobs can proceed best-effort; the
//! mutations return errors so callers know to skip dependent steps.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::fields::{
    flatten_field_values, normalize_fields, FieldKind, FieldSchema, ItemFieldValues,
};
use crate::replay::FieldUpdate;
use crate::{Error, GitHubClient, Result};

const PROJECT_FIELDS_QUERY: &str = r#"
query($projectId: ID!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: 50) {
        nodes {
          __typename
          ... on ProjectV2Field {
            id
            name
            dataType
          }
          ... on ProjectV2SingleSelectField {
            id
            name
            dataType
            options {
              id
              name
            }
          }
          ... on ProjectV2IterationField {
            id
            name
            dataType
            configuration {
              iterations {
                id
                title
                startDate
              }
            }
          }
        }
      }
    }
  }
}
"#;

const ISSUE_FIELD_VALUES_QUERY: &str = r#"
query($owner: String!, $repo: String!, $issueNumber: Int!) {
  repository(owner: $owner, name: $repo) {
    issue(number: $issueNumber) {
      projectItems(first: 10) {
        nodes {
          fieldValues(first: 20) {
            nodes {
              __typename
              ... on ProjectV2ItemFieldSingleSelectValue {
                field {
                  ... on ProjectV2FieldCommon {
                    name
                  }
                }
                optionId
                name
              }
              ... on ProjectV2ItemFieldTextValue {
                field {
                  ... on ProjectV2FieldCommon {
                    name
                  }
                }
                text
              }
              ... on ProjectV2ItemFieldNumberValue {
                field {
                  ... on ProjectV2FieldCommon {
                    name
                  }
                }
                number
              }
              ... on ProjectV2ItemFieldIterationValue {
                field {
                  ... on ProjectV2FieldCommon {
                    name
                  }
                }
                iterationId
                startDate
                title
              }
            }
          }
        }
      }
    }
  }
}
"#;

const ITEM_FIELD_VALUES_QUERY: &str = r#"
query($itemId: ID!) {
  node(id: $itemId) {
    ... on ProjectV2Item {
      fieldValues(first: 10) {
        nodes {
          __typename
          ... on ProjectV2ItemFieldSingleSelectValue {
            optionId
            field {
              ... on ProjectV2FieldCommon {
                id
                name
              }
            }
          }
          ... on ProjectV2ItemFieldTextValue {
            text
            field {
              ... on ProjectV2FieldCommon {
                id
                name
              }
            }
          }
          ... on ProjectV2ItemFieldNumberValue {
            number
            field {
              ... on ProjectV2FieldCommon {
                id
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

const ADD_ITEM_MUTATION: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item {
      id
    }
  }
}
"#;

const UPDATE_FIELD_MUTATION: &str = r#"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $value: ProjectV2FieldValue!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $projectId,
    itemId: $itemId,
    fieldId: $fieldId,
    value: $value
  }) {
    projectV2Item {
      id
    }
  }
}
"#;

const REPOSITORY_PROJECTS_QUERY: &str = r#"
query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    projectsV2(first: 10) {
      nodes {
        id
        title
      }
    }
  }
}
"#;

/// A ProjectV2 board linked to a repository
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct NodeList {
    #[serde(default)]
    nodes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ProjectNodeData {
    node: Option<ProjectFieldsNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectFieldsNode {
    fields: NodeList,
}

#[derive(Debug, Deserialize)]
struct IssueFieldData {
    repository: Option<RepositoryIssue>,
}

#[derive(Debug, Deserialize)]
struct RepositoryIssue {
    issue: Option<IssueProjectItems>,
}

#[derive(Debug, Deserialize)]
struct IssueProjectItems {
    #[serde(rename = "projectItems")]
    project_items: ProjectItemList,
}

#[derive(Debug, Deserialize)]
struct ProjectItemList {
    #[serde(default)]
    nodes: Vec<ProjectItemNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectItemNode {
    #[serde(rename = "fieldValues")]
    field_values: NodeList,
}

#[derive(Debug, Deserialize)]
struct ItemNodeData {
    node: Option<ItemFieldsNode>,
}

#[derive(Debug, Deserialize)]
struct ItemFieldsNode {
    #[serde(rename = "fieldValues")]
    field_values: NodeList,
}

#[derive(Debug, Deserialize)]
struct AddItemData {
    #[serde(rename = "addProjectV2ItemById")]
    add_item: Option<AddItemPayload>,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: ItemId,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryProjectsData {
    repository: Option<RepositoryProjects>,
}

#[derive(Debug, Deserialize)]
struct RepositoryProjects {
    #[serde(rename = "projectsV2")]
    projects: ProjectRefList,
}

#[derive(Debug, Deserialize)]
struct ProjectRefList {
    #[serde(default)]
    nodes: Vec<ProjectRef>,
}

// Current-value nodes carry the field id and the destination-side value id,
// unlike the by-name query used for the source item.

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum CurrentValueNode {
    #[serde(rename_all = "camelCase")]
    ProjectV2ItemFieldSingleSelectValue {
        field: Option<FieldIdRef>,
        option_id: Option<String>,
    },
    ProjectV2ItemFieldTextValue {
        field: Option<FieldIdRef>,
        text: Option<String>,
    },
    ProjectV2ItemFieldNumberValue {
        field: Option<FieldIdRef>,
        number: Option<f64>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct FieldIdRef {
    id: Option<String>,
}

/// Pick the value the item holds for the given field id, rendered as the
/// comparable id/text form
fn current_value_for(nodes: &[Value], field_id: &str) -> Option<String> {
    for node in nodes {
        let Ok(parsed) = serde_json::from_value::<CurrentValueNode>(node.clone()) else {
            continue;
        };

        let (field, value) = match parsed {
            CurrentValueNode::ProjectV2ItemFieldSingleSelectValue { field, option_id } => {
                (field, option_id)
            }
            CurrentValueNode::ProjectV2ItemFieldTextValue { field, text } => (field, text),
            CurrentValueNode::ProjectV2ItemFieldNumberValue { field, number } => {
                (field, number.map(|n| n.to_string()))
            }
            CurrentValueNode::Other => continue,
        };

        if field.and_then(|f| f.id).as_deref() == Some(field_id) {
            return value;
        }
    }

    None
}

impl GitHubClient {
    /// Fetch and normalize the project's custom field schema
    ///
    /// Any failure yields an empty schema; callers treat that as "no schema
    /// available" and proceed best-effort.
    pub async fn project_fields(&self, project_id: &str) -> FieldSchema {
        let variables = json!({ "projectId": project_id });

        let data: ProjectNodeData = match self.graphql(PROJECT_FIELDS_QUERY, variables).await {
            Ok(data) => data,
            Err(e) => {
                warn!(project_id, error = %e, "Failed to fetch project fields");
                return FieldSchema::new();
            }
        };

        let Some(node) = data.node else {
            warn!(project_id, "Project node not found");
            return FieldSchema::new();
        };

        let schema = normalize_fields(&node.fields.nodes);
        info!(project_id, count = schema.len(), "Fetched project fields");

        schema
    }

    /// Read an issue's current project field values, flattened by field name
    ///
    /// An issue with no project items yields an empty map; that is the
    /// normal state for an item not yet on any board.
    pub async fn issue_field_values(&self, issue_number: u64) -> ItemFieldValues {
        let variables = json!({
            "owner": self.owner(),
            "repo": self.repo(),
            "issueNumber": issue_number,
        });

        let data: IssueFieldData = match self.graphql(ISSUE_FIELD_VALUES_QUERY, variables).await {
            Ok(data) => data,
            Err(e) => {
                warn!(issue_number, error = %e, "Failed to fetch issue field values");
                return ItemFieldValues::new();
            }
        };

        let Some(issue) = data.repository.and_then(|r| r.issue) else {
            warn!(issue_number, "Issue missing from field value response");
            return ItemFieldValues::new();
        };

        let mut values = ItemFieldValues::new();
        for item in issue.project_items.nodes {
            values.extend(flatten_field_values(&item.field_values.nodes));
        }

        debug!(issue_number, count = values.len(), "Extracted source field values");

        values
    }

    /// The value an item currently holds for a field, as an option id or
    /// raw text/number rendering
    ///
    /// Used for the single-select idempotence check before an update.
    pub async fn current_field_value(&self, item_id: &str, field_id: &str) -> Option<String> {
        let data: ItemNodeData = match self
            .graphql(ITEM_FIELD_VALUES_QUERY, json!({ "itemId": item_id }))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(item_id, error = %e, "Failed to read current field value");
                return None;
            }
        };

        current_value_for(&data.node?.field_values.nodes, field_id)
    }

    /// Attach a content node (an issue's node id) to the project
    ///
    /// Returns the project item id, which subsequent field mutations target.
    pub async fn add_item_to_project(&self, project_id: &str, content_id: &str) -> Result<String> {
        let variables = json!({
            "projectId": project_id,
            "contentId": content_id,
        });

        let data: AddItemData = self.graphql(ADD_ITEM_MUTATION, variables).await?;

        let payload = data
            .add_item
            .ok_or_else(|| Error::Graphql("addProjectV2ItemById returned no item".to_string()))?;

        info!(item_id = %payload.item.id, "Added item to project");

        Ok(payload.item.id)
    }

    /// Set one field on a project item
    pub async fn update_item_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        update: &FieldUpdate,
    ) -> Result<()> {
        let variables = json!({
            "projectId": project_id,
            "itemId": item_id,
            "fieldId": field_id,
            "value": update.payload(),
        });

        let _: Value = self.graphql(UPDATE_FIELD_MUTATION, variables).await?;

        Ok(())
    }

    /// Iteration titles and ids of the project's iteration field
    ///
    /// Discovery helper; its output is what gets pasted into the
    /// `iteration_map` configuration.
    pub async fn project_iterations(&self, project_id: &str) -> HashMap<String, String> {
        let schema = self.project_fields(project_id).await;

        for field in schema.values() {
            if let FieldKind::Iteration { iterations } = &field.kind {
                return iterations
                    .iter()
                    .map(|(title, iteration)| (title.clone(), iteration.id.clone()))
                    .collect();
            }
        }

        warn!(project_id, "No iteration field found on project");
        HashMap::new()
    }

    /// ProjectV2 boards linked to this repository
    pub async fn repository_projects(&self) -> Vec<ProjectRef> {
        let variables = json!({
            "owner": self.owner(),
            "repo": self.repo(),
        });

        let data: RepositoryProjectsData =
            match self.graphql(REPOSITORY_PROJECTS_QUERY, variables).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(error = %e, "Failed to fetch repository projects");
                    return Vec::new();
                }
            };

        match data.repository {
            Some(repository) => repository.projects.nodes,
            None => {
                warn!("Repository missing from projects response");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value_nodes() -> Vec<Value> {
        vec![
            json!({
                "__typename": "ProjectV2ItemFieldSingleSelectValue",
                "optionId": "OPT_1",
                "field": {"id": "F_status", "name": "Status"}
            }),
            json!({
                "__typename": "ProjectV2ItemFieldNumberValue",
                "number": 5.0,
                "field": {"id": "F_estimate", "name": "Estimate"}
            }),
            json!({
                "__typename": "ProjectV2ItemFieldTextValue",
                "text": "notes here",
                "field": {"id": "F_notes", "name": "Notes"}
            }),
        ]
    }

    #[test]
    fn test_current_value_matches_field_id() {
        let nodes = value_nodes();
        assert_eq!(
            current_value_for(&nodes, "F_status"),
            Some("OPT_1".to_string())
        );
        assert_eq!(
            current_value_for(&nodes, "F_estimate"),
            Some("5".to_string())
        );
        assert_eq!(
            current_value_for(&nodes, "F_notes"),
            Some("notes here".to_string())
        );
    }

    #[test]
    fn test_current_value_absent_field() {
        assert_eq!(current_value_for(&value_nodes(), "F_missing"), None);
    }

    #[test]
    fn test_current_value_ignores_unknown_variants() {
        let nodes = vec![json!({
            "__typename": "ProjectV2ItemFieldLabelValue",
            "field": {"id": "F_labels", "name": "Labels"}
        })];
        assert_eq!(current_value_for(&nodes, "F_labels"), None);
    }
}
