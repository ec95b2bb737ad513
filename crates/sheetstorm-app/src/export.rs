use serde::Serialize;
use sheetstorm_api::ApiError;
use sheetstorm_core::{GraphEdge, GraphNode};

/// Writes the current graph out in some file format.
pub trait GraphExporter: Send + Sync {
    /// File extension, without the dot.
    fn extension(&self) -> &'static str;

    fn export(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<Vec<u8>, ApiError>;
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    nodes: &'a [GraphNode],
    edges: &'a [GraphEdge],
}

/// Pretty-printed JSON of the local graph model.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl GraphExporter for JsonExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn export(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec_pretty(&ExportDocument { nodes, edges })
            .map_err(|e| ApiError::internal(format!("Failed to serialize graph: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstorm_core::{LocalId, NodeKind};

    #[test]
    fn json_export_lists_nodes() {
        let node = GraphNode::pending(LocalId(1), NodeKind::Attacker, "APT");
        let bytes = JsonExporter.export(&[node], &[]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["nodes"][0]["label"], "APT");
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(0));
    }
}
