//! Data models exchanged with the SuperPlane API.
//!
//! Field names follow the API's camelCase JSON. Everything the client does not
//! interpret (node and edge definitions, event payloads) is carried as raw
//! [`serde_json::Value`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Domain type used to scope secrets to an organization.
pub const DOMAIN_TYPE_ORGANIZATION: &str = "DOMAIN_TYPE_ORGANIZATION";

/// Identity of the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub metadata: OrganizationMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSpec {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

/// A workflow graph of nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    pub metadata: CanvasMetadata,
    #[serde(default)]
    pub spec: CanvasSpec,
}

impl Canvas {
    /// A canvas with the given name and no nodes or edges.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            metadata: CanvasMetadata {
                name: name.into(),
                ..CanvasMetadata::default()
            },
            spec: CanvasSpec::default(),
        }
    }

    pub fn id(&self) -> &str {
        self.metadata.id.as_deref().unwrap_or("")
    }
}

/// Execution of a node, triggered by an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub result_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Event emitted on a canvas node channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub executions: Vec<NodeExecution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReference {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub node_id: String,
}

/// Event waiting in a node's queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_event: Option<EventReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalSecretData {
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretSpec {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalSecretData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub metadata: SecretMetadata,
    #[serde(default)]
    pub spec: SecretSpec,
}

impl Secret {
    pub fn id(&self) -> &str {
        self.metadata.id.as_deref().unwrap_or("")
    }

    /// Key names of a local secret, sorted. Values are never exposed here.
    pub fn key_names(&self) -> Vec<String> {
        self.spec
            .local
            .as_ref()
            .map(|local| local.data.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeOrganizationResponse {
    #[serde(default)]
    pub organization: Organization,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListCanvasesResponse {
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeCanvasResponse {
    #[serde(default)]
    pub canvas: Canvas,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListEventsResponse {
    #[serde(default)]
    pub events: Vec<CanvasEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListExecutionsResponse {
    #[serde(default)]
    pub executions: Vec<NodeExecution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQueueItemsResponse {
    #[serde(default)]
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSecretsResponse {
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeSecretResponse {
    #[serde(default)]
    pub secret: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canvas_decodes_camel_case_and_defaults() {
        let canvas: Canvas = serde_json::from_value(json!({
            "metadata": {
                "id": "c-1",
                "name": "deploy",
                "createdAt": "2024-05-01T10:00:00Z"
            }
        }))
        .unwrap();

        assert_eq!(canvas.id(), "c-1");
        assert_eq!(canvas.metadata.name, "deploy");
        assert!(canvas.metadata.created_at.is_some());
        assert!(canvas.spec.nodes.is_empty());
        assert!(canvas.spec.edges.is_empty());
    }

    #[test]
    fn test_empty_canvas_serializes_empty_graph() {
        let value = serde_json::to_value(Canvas::empty("demo")).unwrap();
        assert_eq!(
            value,
            json!({"metadata": {"name": "demo"}, "spec": {"nodes": [], "edges": []}})
        );
    }

    #[test]
    fn test_secret_key_names_are_sorted() {
        let secret: Secret = serde_json::from_value(json!({
            "metadata": {"name": "creds"},
            "spec": {"provider": "PROVIDER_LOCAL", "local": {"data": {"b": "2", "a": "1"}}}
        }))
        .unwrap();

        assert_eq!(secret.key_names(), vec!["a", "b"]);
        assert_eq!(Secret::default().key_names(), Vec::<String>::new());
    }

    #[test]
    fn test_me_without_organization() {
        let me: Me = serde_json::from_value(json!({"id": "u-1", "email": "a@b.c"})).unwrap();
        assert_eq!(me.organization_id, None);
    }
}
