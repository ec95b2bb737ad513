use crate::{AttackGraphApi, ClientConfig};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sheetstorm_api::{
    ApiError, AutoGenerateRequest, AutoGenerateResponse, CreateEdgeRequest, CreateNodeRequest,
    EdgeRecord, EdgeTypesResponse, ErrorBody, GraphSnapshot, NodeRecord, NodeTypesResponse,
    TimelinePage, UpdateEdgeRequest, UpdateNodeRequest,
};
use sheetstorm_core::{EdgeId, NodeId, TimelineEvent};

/// Largest page the timeline endpoint serves.
pub const TIMELINE_PAGE_SIZE: u32 = 200;

/// REST client bound to one incident's attack graph.
#[derive(Clone)]
pub struct HttpAttackGraphClient {
    http: Client,
    config: ClientConfig,
    incident_id: String,
}

impl HttpAttackGraphClient {
    pub fn new(config: ClientConfig, incident_id: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            incident_id: incident_id.into(),
        })
    }

    pub fn incident_id(&self) -> &str {
        &self.incident_id
    }

    fn graph_path(&self, rest: &str) -> String {
        format!("incidents/{}/attack-graph{}", self.incident_id, rest)
    }

    fn body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
        serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(value: Option<Value>, what: &str) -> Result<T, ApiError> {
        let value = value.ok_or_else(|| ApiError::decode(format!("Empty response for {what}")))?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::decode(format!("Malformed {what} response: {e}")))
    }

    /// Sends one request, retrying transport failures and 5xx answers.
    ///
    /// Returns `None` for 204 and empty success bodies.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.config.url(path);
        let mut attempt = 0u32;

        loop {
            let mut builder = self.http.request(method.clone(), &url);
            if let Some(token) = &self.config.token {
                builder = builder.bearer_auth(token);
            }
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let error = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.bytes().await {
                        Ok(bytes) if status.is_success() => {
                            if status == StatusCode::NO_CONTENT || bytes.is_empty() {
                                return Ok(None);
                            }
                            return serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                                ApiError::decode(format!("Invalid JSON from {method} {path}: {e}"))
                            });
                        }
                        Ok(bytes) => {
                            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                                .ok()
                                .and_then(|b| b.best_message().map(str::to_string))
                                .unwrap_or_else(|| {
                                    let text = String::from_utf8_lossy(&bytes).trim().to_string();
                                    if text.is_empty() {
                                        status.to_string()
                                    } else {
                                        text
                                    }
                                });
                            ApiError::from_status(status.as_u16(), message)
                        }
                        Err(e) => ApiError::transport(format!("Network error: {e}")),
                    }
                }
                Err(e) => ApiError::transport(format!("Network error: {e}")),
            };

            if error.is_retryable() && attempt < self.config.max_retries {
                attempt += 1;
                tracing::warn!(
                    "{method} {path} failed ({error}), retrying ({attempt}/{})",
                    self.config.max_retries
                );
                continue;
            }
            return Err(error);
        }
    }
}

#[async_trait]
impl AttackGraphApi for HttpAttackGraphClient {
    async fn fetch_graph(&self) -> Result<GraphSnapshot, ApiError> {
        let value = self
            .request(Method::GET, &self.graph_path(""), &[], None)
            .await?;
        Self::decode(value, "attack graph")
    }

    async fn create_node(&self, request: &CreateNodeRequest) -> Result<NodeRecord, ApiError> {
        let value = self
            .request(
                Method::POST,
                &self.graph_path("/nodes"),
                &[],
                Some(Self::body(request)?),
            )
            .await?;
        Self::decode(value, "node")
    }

    async fn update_node(
        &self,
        id: &NodeId,
        request: &UpdateNodeRequest,
    ) -> Result<NodeRecord, ApiError> {
        let value = self
            .request(
                Method::PUT,
                &self.graph_path(&format!("/nodes/{id}")),
                &[],
                Some(Self::body(request)?),
            )
            .await?;
        Self::decode(value, "node")
    }

    async fn delete_node(&self, id: &NodeId) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &self.graph_path(&format!("/nodes/{id}")),
            &[],
            None,
        )
        .await
        .map(|_| ())
    }

    async fn create_edge(&self, request: &CreateEdgeRequest) -> Result<EdgeRecord, ApiError> {
        let value = self
            .request(
                Method::POST,
                &self.graph_path("/edges"),
                &[],
                Some(Self::body(request)?),
            )
            .await?;
        Self::decode(value, "edge")
    }

    async fn update_edge(
        &self,
        id: &EdgeId,
        request: &UpdateEdgeRequest,
    ) -> Result<EdgeRecord, ApiError> {
        let value = self
            .request(
                Method::PUT,
                &self.graph_path(&format!("/edges/{id}")),
                &[],
                Some(Self::body(request)?),
            )
            .await?;
        Self::decode(value, "edge")
    }

    async fn delete_edge(&self, id: &EdgeId) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &self.graph_path(&format!("/edges/{id}")),
            &[],
            None,
        )
        .await
        .map(|_| ())
    }

    async fn auto_generate(
        &self,
        request: AutoGenerateRequest,
    ) -> Result<AutoGenerateResponse, ApiError> {
        let value = self
            .request(
                Method::POST,
                &self.graph_path("/auto-generate"),
                &[],
                Some(Self::body(&request)?),
            )
            .await?;
        // Older servers answer with an empty body.
        match value {
            Some(value) => Self::decode(Some(value), "auto-generate"),
            None => Ok(AutoGenerateResponse::default()),
        }
    }

    async fn fetch_timeline(&self) -> Result<Vec<TimelineEvent>, ApiError> {
        let path = format!("incidents/{}/timeline", self.incident_id);
        let mut events = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("page", page.to_string()),
                ("per_page", TIMELINE_PAGE_SIZE.to_string()),
            ];
            let value = self.request(Method::GET, &path, &query, None).await?;
            let current: TimelinePage = Self::decode(value, "timeline")?;
            let done = current.items.is_empty() || current.page >= current.pages;
            events.extend(current.items);
            if done {
                break;
            }
            page += 1;
        }

        Ok(events)
    }

    async fn list_node_types(&self) -> Result<Vec<String>, ApiError> {
        let value = self
            .request(Method::GET, "attack-graph/node-types", &[], None)
            .await?;
        Self::decode::<NodeTypesResponse>(value, "node types").map(|r| r.node_types)
    }

    async fn list_edge_types(&self) -> Result<Vec<String>, ApiError> {
        let value = self
            .request(Method::GET, "attack-graph/edge-types", &[], None)
            .await?;
        Self::decode::<EdgeTypesResponse>(value, "edge types").map(|r| r.edge_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_scoped_to_incident() {
        let client =
            HttpAttackGraphClient::new(ClientConfig::new("http://127.0.0.1:9/api/v1"), "inc-7")
                .unwrap();
        assert_eq!(client.graph_path(""), "incidents/inc-7/attack-graph");
        assert_eq!(
            client.graph_path("/nodes/n1"),
            "incidents/inc-7/attack-graph/nodes/n1"
        );
        assert_eq!(client.incident_id(), "inc-7");
    }

    #[test]
    fn empty_body_is_a_decode_error_for_records() {
        let err = HttpAttackGraphClient::decode::<NodeRecord>(None, "node").unwrap_err();
        assert_eq!(err.code, "decode");
    }

    #[test]
    fn decodes_snapshot_value() {
        let snapshot: GraphSnapshot = HttpAttackGraphClient::decode(
            Some(serde_json::json!({"nodes": [], "edges": [], "incident_id": "x"})),
            "attack graph",
        )
        .unwrap();
        assert!(snapshot.is_empty());
    }
}
