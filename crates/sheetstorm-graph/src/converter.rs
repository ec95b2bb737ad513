use sheetstorm_api::{EdgeRecord, GraphSnapshot, NodeRecord};
use sheetstorm_core::{
    EdgeRenderType, GraphEdge, GraphNode, LocalIdAllocator, NodeId, SyncState,
};
use std::collections::HashSet;

/// Nodes and edges ready for the canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl RenderGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Turns server records into the local graph model.
pub struct GraphConverter;

impl GraphConverter {
    pub fn convert_node(record: &NodeRecord, ids: &LocalIdAllocator) -> GraphNode {
        GraphNode {
            local_id: ids.next_id(),
            id: Some(record.id.clone()),
            state: SyncState::Confirmed,
            kind: record.node_type.clone(),
            role: record.node_type.role(),
            label: record.label.clone(),
            position: record.position(),
            is_initial_access: record.is_initial_access.unwrap_or(false),
            is_objective: record.is_objective.unwrap_or(false),
            metadata: record.extra_data.clone().unwrap_or_default(),
            correlation: record.correlation,
            compromised_host_id: record.compromised_host_id.clone(),
            compromised_account_id: record.compromised_account_id.clone(),
        }
    }

    pub fn convert_edge(record: &EdgeRecord, ids: &LocalIdAllocator) -> GraphEdge {
        GraphEdge {
            local_id: ids.next_id(),
            id: Some(record.id.clone()),
            state: SyncState::Confirmed,
            source: record.source_node_id.clone(),
            target: record.target_node_id.clone(),
            kind: record.edge_type,
            render_type: EdgeRenderType::Attack,
            label: record.label.clone(),
            mitre_tactic: record.mitre_tactic.clone(),
            mitre_technique: record.mitre_technique.clone(),
            linked_event_id: record.linked_event_id(),
            description: record.description.clone(),
            timestamp: record.timestamp.clone(),
        }
    }

    /// Converts a full snapshot. Edges pointing at nodes missing from the
    /// snapshot are dropped so the model never holds a dangling edge.
    pub fn to_render_graph(
        nodes: &[NodeRecord],
        edges: &[EdgeRecord],
        ids: &LocalIdAllocator,
    ) -> RenderGraph {
        let graph_nodes: Vec<GraphNode> = nodes
            .iter()
            .map(|record| Self::convert_node(record, ids))
            .collect();
        let known: HashSet<&NodeId> = nodes.iter().map(|record| &record.id).collect();

        let mut graph_edges = Vec::with_capacity(edges.len());
        for record in edges {
            if !known.contains(&record.source_node_id) {
                tracing::warn!(
                    "Dropping edge {} because source node {} is missing from snapshot",
                    record.id,
                    record.source_node_id
                );
                continue;
            }
            if !known.contains(&record.target_node_id) {
                tracing::warn!(
                    "Dropping edge {} because target node {} is missing from snapshot",
                    record.id,
                    record.target_node_id
                );
                continue;
            }
            graph_edges.push(Self::convert_edge(record, ids));
        }

        RenderGraph {
            nodes: graph_nodes,
            edges: graph_edges,
        }
    }

    pub fn from_snapshot(snapshot: &GraphSnapshot, ids: &LocalIdAllocator) -> RenderGraph {
        Self::to_render_graph(&snapshot.nodes, &snapshot.edges, ids)
    }
}
