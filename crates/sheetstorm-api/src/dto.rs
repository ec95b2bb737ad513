use serde::{Deserialize, Serialize};
use sheetstorm_core::{
    Correlation, EdgeId, EdgeKind, EventId, Metadata, NodeId, NodeKind, Position, TimelineEvent,
};

/// Attack graph node as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub node_type: NodeKind,
    pub label: String,
    // Nullable columns on the server side.
    #[serde(default)]
    pub position_x: Option<f64>,
    #[serde(default)]
    pub position_y: Option<f64>,
    #[serde(default)]
    pub is_initial_access: Option<bool>,
    #[serde(default)]
    pub is_objective: Option<bool>,
    #[serde(default)]
    pub extra_data: Option<Metadata>,
    #[serde(default)]
    pub correlation: Option<Correlation>,
    #[serde(default)]
    pub compromised_host_id: Option<String>,
    #[serde(default)]
    pub compromised_account_id: Option<String>,
}

impl NodeRecord {
    pub fn position(&self) -> Position {
        Position::new(
            self.position_x.unwrap_or_default(),
            self.position_y.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub edge_type: EdgeKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub mitre_tactic: Option<String>,
    #[serde(default)]
    pub mitre_technique: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub extra_data: Option<Metadata>,
}

impl EdgeRecord {
    /// The server stores the cross-linked timeline event inside `extra_data`.
    pub fn linked_event_id(&self) -> Option<EventId> {
        self.extra_data
            .as_ref()?
            .get("timeline_event_id")?
            .as_str()
            .map(|id| EventId(id.to_string()))
    }
}

/// Full graph as served by `GET /incidents/{id}/attack-graph`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AutoGenerateRequest {
    pub clear_existing: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoGenerateResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    pub node_type: NodeKind,
    pub label: String,
    pub extra_data: Metadata,
    pub position_x: f64,
    pub position_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_initial_access: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_objective: Option<bool>,
}

impl CreateNodeRequest {
    pub fn new(node_type: NodeKind, label: impl Into<String>, position: Position) -> Self {
        Self {
            node_type,
            label: label.into(),
            extra_data: Metadata::new(),
            position_x: position.x,
            position_y: position.y,
            is_initial_access: None,
            is_objective: None,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.position_x, self.position_y)
    }
}

/// Partial node update; absent fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateNodeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_initial_access: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_objective: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Metadata>,
}

impl UpdateNodeRequest {
    /// Body sent on drag end.
    pub fn position(position: Position) -> Self {
        Self {
            position_x: Some(position.x),
            position_y: Some(position.y),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEdgeRequest {
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub edge_type: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre_tactic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre_technique: Option<String>,
}

impl CreateEdgeRequest {
    pub fn new(source: NodeId, target: NodeId, edge_type: EdgeKind) -> Self {
        Self {
            source_node_id: source,
            target_node_id: target,
            edge_type,
            label: None,
            description: None,
            timeline_event_id: None,
            mitre_tactic: None,
            mitre_technique: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEdgeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre_tactic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre_technique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One page of `GET /incidents/{id}/timeline`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelinePage {
    #[serde(default)]
    pub items: Vec<TimelineEvent>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeTypesResponse {
    pub node_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeTypesResponse {
    pub edge_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_record_tolerates_server_nulls() {
        let record: NodeRecord = serde_json::from_value(json!({
            "id": "n1",
            "incident_id": "inc",
            "node_type": "workstation",
            "label": "WS01",
            "position_x": null,
            "position_y": 40.5,
            "is_initial_access": null,
            "extra_data": null,
            "created_by": "u1"
        }))
        .unwrap();
        assert_eq!(record.position(), Position::new(0.0, 40.5));
        assert_eq!(record.node_type, NodeKind::Workstation);
        assert!(record.extra_data.is_none());
        assert!(record.correlation.is_none());
    }

    #[test]
    fn edge_record_reads_linked_event_from_extra_data() {
        let record: EdgeRecord = serde_json::from_value(json!({
            "id": "e1",
            "source_node_id": "n1",
            "target_node_id": "n2",
            "edge_type": "lateral_movement",
            "extra_data": {"timeline_event_id": "ev9", "timeline_event_activity": "RDP"}
        }))
        .unwrap();
        assert_eq!(record.linked_event_id(), Some(EventId("ev9".into())));
        assert_eq!(record.edge_type, EdgeKind::LateralMovement);
    }

    #[test]
    fn position_update_only_sends_coordinates() {
        let body = serde_json::to_value(UpdateNodeRequest::position(Position::new(1.0, 2.0)))
            .unwrap();
        assert_eq!(body, json!({"position_x": 1.0, "position_y": 2.0}));
        assert!(UpdateNodeRequest::default().is_empty());
    }

    #[test]
    fn create_edge_request_omits_unset_optionals() {
        let body = serde_json::to_value(CreateEdgeRequest::new(
            NodeId::new("a"),
            NodeId::new("b"),
            EdgeKind::AssociatedWith,
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "source_node_id": "a",
                "target_node_id": "b",
                "edge_type": "associated_with"
            })
        );
    }
}
