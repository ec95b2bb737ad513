use crate::converter::RenderGraph;
use sheetstorm_core::{EdgeId, GraphEdge, GraphNode, LocalId, NodeId, Position, SyncState};
use std::collections::HashSet;

/// What a cascading delete took out of the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Removed {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Working copy of the attack graph held by the editor.
///
/// Small graphs only (tens of nodes), so lookups are linear scans.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_render(graph: RenderGraph) -> Self {
        Self {
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }

    /// Swap in a fresh server snapshot.
    pub fn replace(&mut self, graph: RenderGraph) {
        self.nodes = graph.nodes;
        self.edges = graph.edges;
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn push_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    /// Appends an edge if both endpoints are present. Returns whether it was added.
    pub fn push_edge(&mut self, edge: GraphEdge) -> bool {
        if self.node_by_id(&edge.source).is_none() || self.node_by_id(&edge.target).is_none() {
            tracing::warn!(
                "Refusing edge {} -> {}: endpoint not in graph",
                edge.source,
                edge.target
            );
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn node(&self, local_id: LocalId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.local_id == local_id)
    }

    pub fn node_mut(&mut self, local_id: LocalId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.local_id == local_id)
    }

    pub fn node_by_id(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.has_id(id))
    }

    pub fn edge(&self, local_id: LocalId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.local_id == local_id)
    }

    pub fn edge_mut(&mut self, local_id: LocalId) -> Option<&mut GraphEdge> {
        self.edges.iter_mut().find(|e| e.local_id == local_id)
    }

    pub fn edge_by_id(&self, id: &EdgeId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id.as_ref() == Some(id))
    }

    pub fn edges_between(&self, source: &NodeId, target: &NodeId) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.connects(source, target))
            .collect()
    }

    /// Oldest unconfirmed edge for a node pair.
    pub fn pending_edge_between(&self, source: &NodeId, target: &NodeId) -> Option<LocalId> {
        self.edges
            .iter()
            .find(|e| e.state == SyncState::Pending && e.connects(source, target))
            .map(|e| e.local_id)
    }

    pub fn set_position(&mut self, local_id: LocalId, position: Position) -> bool {
        match self.node_mut(local_id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn confirm_node(&mut self, local_id: LocalId, id: NodeId) -> bool {
        match self.node_mut(local_id) {
            Some(node) => {
                node.id = Some(id);
                node.state = SyncState::Confirmed;
                true
            }
            None => false,
        }
    }

    pub fn mark_node_failed(&mut self, local_id: LocalId) -> bool {
        match self.node_mut(local_id) {
            Some(node) => {
                node.state = SyncState::Failed;
                true
            }
            None => false,
        }
    }

    pub fn confirm_edge(&mut self, local_id: LocalId, id: EdgeId) -> bool {
        match self.edge_mut(local_id) {
            Some(edge) => {
                edge.id = Some(id);
                edge.state = SyncState::Confirmed;
                true
            }
            None => false,
        }
    }

    /// Removes the given nodes and every edge touching any of them.
    pub fn remove_nodes(&mut self, local_ids: &[LocalId]) -> Removed {
        let doomed: HashSet<LocalId> = local_ids.iter().copied().collect();

        let (removed_nodes, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| doomed.contains(&n.local_id));
        self.nodes = kept;

        let removed_ids: HashSet<&NodeId> =
            removed_nodes.iter().filter_map(|n| n.id.as_ref()).collect();
        let (removed_edges, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| removed_ids.contains(&e.source) || removed_ids.contains(&e.target));
        self.edges = kept;

        Removed {
            nodes: removed_nodes,
            edges: removed_edges,
        }
    }

    pub fn remove_edges(&mut self, local_ids: &[LocalId]) -> Vec<GraphEdge> {
        let doomed: HashSet<LocalId> = local_ids.iter().copied().collect();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| doomed.contains(&e.local_id));
        self.edges = kept;
        removed
    }

    /// True when every edge endpoint names a node currently in the model.
    pub fn is_consistent(&self) -> bool {
        let ids: HashSet<&NodeId> = self.nodes.iter().filter_map(|n| n.id.as_ref()).collect();
        self.edges
            .iter()
            .all(|e| ids.contains(&e.source) && ids.contains(&e.target))
    }
}
