//! Attack graph REST contract and its HTTP implementation.
//!
//! Every call is scoped to the incident the client was built for.

mod config;
mod http;

pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
pub use http::{HttpAttackGraphClient, TIMELINE_PAGE_SIZE};

use async_trait::async_trait;
use sheetstorm_api::{
    ApiError, AutoGenerateRequest, AutoGenerateResponse, CreateEdgeRequest, CreateNodeRequest,
    EdgeRecord, GraphSnapshot, NodeRecord, UpdateEdgeRequest, UpdateNodeRequest,
};
use sheetstorm_core::{EdgeId, NodeId, TimelineEvent};

#[async_trait]
pub trait AttackGraphApi: Send + Sync {
    /// `GET /incidents/{id}/attack-graph`
    async fn fetch_graph(&self) -> Result<GraphSnapshot, ApiError>;

    async fn create_node(&self, request: &CreateNodeRequest) -> Result<NodeRecord, ApiError>;

    /// Also used for the drag-end position write.
    async fn update_node(
        &self,
        id: &NodeId,
        request: &UpdateNodeRequest,
    ) -> Result<NodeRecord, ApiError>;

    /// The server removes incident edges itself.
    async fn delete_node(&self, id: &NodeId) -> Result<(), ApiError>;

    async fn create_edge(&self, request: &CreateEdgeRequest) -> Result<EdgeRecord, ApiError>;

    async fn update_edge(
        &self,
        id: &EdgeId,
        request: &UpdateEdgeRequest,
    ) -> Result<EdgeRecord, ApiError>;

    async fn delete_edge(&self, id: &EdgeId) -> Result<(), ApiError>;

    async fn auto_generate(
        &self,
        request: AutoGenerateRequest,
    ) -> Result<AutoGenerateResponse, ApiError>;

    async fn fetch_timeline(&self) -> Result<Vec<TimelineEvent>, ApiError>;

    async fn list_node_types(&self) -> Result<Vec<String>, ApiError>;

    async fn list_edge_types(&self) -> Result<Vec<String>, ApiError>;
}
