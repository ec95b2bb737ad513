use crate::{
    EdgeId, EdgeKind, EdgeRenderType, EventId, LocalId, NodeId, NodeKind, NodeRole, Position,
};
use serde::{Deserialize, Serialize};

/// Kind-dependent node attributes. Passed through untouched.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Where a local entity stands relative to the server copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SyncState {
    /// Created locally, server has not answered yet.
    Pending,
    #[default]
    Confirmed,
    /// Server rejected the create; kept locally under its placeholder id.
    Failed,
}

/// Related-entity counts computed server-side for host nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    #[serde(default)]
    pub accounts: u32,
    #[serde(default)]
    pub malware: u32,
    #[serde(default)]
    pub network_iocs: u32,
    #[serde(default)]
    pub host_iocs: u32,
    #[serde(default)]
    pub timeline_events: u32,
}

impl Correlation {
    pub fn total(&self) -> u32 {
        self.accounts + self.malware + self.network_iocs + self.host_iocs + self.timeline_events
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub local_id: LocalId,
    /// Absent until the server has persisted the node.
    pub id: Option<NodeId>,
    pub state: SyncState,
    pub kind: NodeKind,
    pub role: NodeRole,
    pub label: String,
    pub position: Position,
    pub is_initial_access: bool,
    pub is_objective: bool,
    pub metadata: Metadata,
    pub correlation: Option<Correlation>,
    pub compromised_host_id: Option<String>,
    pub compromised_account_id: Option<String>,
}

impl GraphNode {
    /// A locally created node awaiting its server id.
    pub fn pending(local_id: LocalId, kind: NodeKind, label: impl Into<String>) -> Self {
        let role = kind.role();
        Self {
            local_id,
            id: None,
            state: SyncState::Pending,
            kind,
            role,
            label: label.into(),
            position: Position::default(),
            is_initial_access: false,
            is_objective: false,
            metadata: Metadata::new(),
            correlation: None,
            compromised_host_id: None,
            compromised_account_id: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn has_id(&self, id: &NodeId) -> bool {
        self.id.as_ref() == Some(id)
    }

    /// Server id when persisted, placeholder otherwise.
    pub fn display_id(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.local_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub local_id: LocalId,
    pub id: Option<EdgeId>,
    pub state: SyncState,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub render_type: EdgeRenderType,
    pub label: Option<String>,
    pub mitre_tactic: Option<String>,
    pub mitre_technique: Option<String>,
    pub linked_event_id: Option<EventId>,
    pub description: Option<String>,
    pub timestamp: Option<String>,
}

impl GraphEdge {
    pub fn pending(local_id: LocalId, source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Self {
            local_id,
            id: None,
            state: SyncState::Pending,
            source,
            target,
            kind,
            render_type: EdgeRenderType::Attack,
            label: None,
            mitre_tactic: None,
            mitre_technique: None,
            linked_event_id: None,
            description: None,
            timestamp: None,
        }
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }

    pub fn connects(&self, source: &NodeId, target: &NodeId) -> bool {
        &self.source == source && &self.target == target
    }

    /// Label shown on the canvas: explicit label, else the relationship name.
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.kind.label(),
        }
    }

    pub fn display_id(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.local_id.to_string(),
        }
    }
}
