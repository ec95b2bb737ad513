#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use sheetstorm_api::{
    ApiError, AutoGenerateRequest, AutoGenerateResponse, CreateEdgeRequest, CreateNodeRequest,
    EdgeRecord, GraphSnapshot, NodeRecord, UpdateEdgeRequest, UpdateNodeRequest,
};
use sheetstorm_app::AttackGraphEditor;
use sheetstorm_client::AttackGraphApi;
use sheetstorm_core::{
    EdgeId, EdgeKind, EventId, NodeId, NodeKind, Position, TimelineEvent,
};
use sheetstorm_events::{Event, Severity};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchGraph,
    CreateNode,
    UpdateNode,
    DeleteNode,
    CreateEdge,
    UpdateEdge,
    DeleteEdge,
    AutoGenerate,
    FetchTimeline,
}

#[derive(Default)]
struct FakeState {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    timeline: Vec<TimelineEvent>,
    /// Inserted into the graph by the next auto-generate call.
    generated: Vec<NodeRecord>,
    seq: u64,
    failing: HashSet<Op>,
    failing_node_deletes: HashSet<NodeId>,
    held_ops: HashSet<Op>,
    held: Vec<(Op, Arc<Semaphore>)>,
    calls: Vec<String>,
    edge_requests: Vec<CreateEdgeRequest>,
    position_writes: Vec<(NodeId, Position)>,
}

/// In-memory stand-in for the incident backend.
///
/// Work is applied when a call arrives; a held call then waits for
/// [`FakeApi::release`] before answering, so tests can reorder responses.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_graph(nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Arc<Self> {
        let api = Self::default();
        {
            let mut state = api.state.lock();
            state.nodes = nodes;
            state.edges = edges;
        }
        Arc::new(api)
    }

    pub fn editor(self: &Arc<Self>) -> AttackGraphEditor {
        AttackGraphEditor::new(Arc::clone(self) as Arc<dyn AttackGraphApi>)
    }

    pub fn set_timeline(&self, events: Vec<TimelineEvent>) {
        self.state.lock().timeline = events;
    }

    pub fn set_generated(&self, nodes: Vec<NodeRecord>) {
        self.state.lock().generated = nodes;
    }

    pub fn fail(&self, op: Op) {
        self.state.lock().failing.insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.state.lock().failing.remove(&op);
    }

    pub fn fail_node_delete(&self, id: &str) {
        self.state.lock().failing_node_deletes.insert(NodeId::new(id));
    }

    pub fn drop_server_edge(&self, id: &str) {
        self.state.lock().edges.retain(|e| e.id.as_str() != id);
    }

    pub fn hold(&self, op: Op) {
        self.state.lock().held_ops.insert(op);
    }

    /// Number of calls of `op` currently waiting.
    pub fn held_count(&self, op: Op) -> usize {
        self.state.lock().held.iter().filter(|(o, _)| *o == op).count()
    }

    /// Lets the `index`-th held call of `op` (in arrival order) answer.
    pub fn release(&self, op: Op, index: usize) {
        let state = self.state.lock();
        if let Some((_, gate)) = state.held.iter().filter(|(o, _)| *o == op).nth(index) {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn server_nodes(&self) -> Vec<NodeRecord> {
        self.state.lock().nodes.clone()
    }

    pub fn server_edges(&self) -> Vec<EdgeRecord> {
        self.state.lock().edges.clone()
    }

    pub fn edge_requests(&self) -> Vec<CreateEdgeRequest> {
        self.state.lock().edge_requests.clone()
    }

    pub fn position_writes(&self) -> Vec<(NodeId, Position)> {
        self.state.lock().position_writes.clone()
    }

    /// Records the call. A failing call still honours `hold`, so tests can
    /// act while the error is on its way.
    async fn begin(&self, op: Op, call: String) -> Result<(), ApiError> {
        let failing = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.failing.contains(&op)
        };
        if failing {
            self.gate(op).await;
            return Err(ApiError::from_status(500, format!("{op:?} failed")));
        }
        Ok(())
    }

    fn next_seq(state: &mut FakeState) -> u64 {
        state.seq += 1;
        state.seq
    }

    async fn gate(&self, op: Op) {
        let gate = {
            let mut state = self.state.lock();
            if !state.held_ops.contains(&op) {
                return;
            }
            let gate = Arc::new(Semaphore::new(0));
            state.held.push((op, Arc::clone(&gate)));
            gate
        };
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait]
impl AttackGraphApi for FakeApi {
    async fn fetch_graph(&self) -> Result<GraphSnapshot, ApiError> {
        self.begin(Op::FetchGraph, "fetch_graph".into()).await?;
        let snapshot = {
            let state = self.state.lock();
            GraphSnapshot {
                nodes: state.nodes.clone(),
                edges: state.edges.clone(),
            }
        };
        self.gate(Op::FetchGraph).await;
        Ok(snapshot)
    }

    async fn create_node(&self, request: &CreateNodeRequest) -> Result<NodeRecord, ApiError> {
        self.begin(Op::CreateNode, format!("create_node:{}", request.label)).await?;
        let record = {
            let mut state = self.state.lock();
            let seq = Self::next_seq(&mut state);
            let mut record = node_record(&format!("n{seq}"), request.node_type.clone());
            record.label = request.label.clone();
            record.position_x = Some(request.position_x);
            record.position_y = Some(request.position_y);
            record.extra_data = Some(request.extra_data.clone());
            state.nodes.push(record.clone());
            record
        };
        self.gate(Op::CreateNode).await;
        Ok(record)
    }

    async fn update_node(
        &self,
        id: &NodeId,
        request: &UpdateNodeRequest,
    ) -> Result<NodeRecord, ApiError> {
        self.begin(Op::UpdateNode, format!("update_node:{id}")).await?;
        let mut state = self.state.lock();
        let FakeState {
            nodes,
            position_writes,
            ..
        } = &mut *state;
        let record = nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| ApiError::from_status(404, "Node not found"))?;
        if let (Some(x), Some(y)) = (request.position_x, request.position_y) {
            record.position_x = Some(x);
            record.position_y = Some(y);
            position_writes.push((id.clone(), Position::new(x, y)));
        }
        if let Some(label) = &request.label {
            record.label = label.clone();
        }
        if let Some(kind) = &request.node_type {
            record.node_type = kind.clone();
        }
        if let Some(flag) = request.is_objective {
            record.is_objective = Some(flag);
        }
        if let Some(extra) = &request.extra_data {
            record.extra_data = Some(extra.clone());
        }
        Ok(record.clone())
    }

    async fn delete_node(&self, id: &NodeId) -> Result<(), ApiError> {
        self.begin(Op::DeleteNode, format!("delete_node:{id}")).await?;
        let mut state = self.state.lock();
        if state.failing_node_deletes.contains(id) {
            return Err(ApiError::from_status(500, "Database error"));
        }
        let before = state.nodes.len();
        state.nodes.retain(|n| &n.id != id);
        if state.nodes.len() == before {
            return Err(ApiError::from_status(404, "Node not found"));
        }
        state
            .edges
            .retain(|e| &e.source_node_id != id && &e.target_node_id != id);
        Ok(())
    }

    async fn create_edge(&self, request: &CreateEdgeRequest) -> Result<EdgeRecord, ApiError> {
        self.begin(
            Op::CreateEdge,
            format!(
                "create_edge:{}->{}",
                request.source_node_id, request.target_node_id
            ),
        ).await?;
        let record = {
            let mut state = self.state.lock();
            state.edge_requests.push(request.clone());
            let known = |id: &NodeId| state.nodes.iter().any(|n| &n.id == id);
            if !known(&request.source_node_id) || !known(&request.target_node_id) {
                return Err(ApiError::from_status(404, "Source or target node not found"));
            }
            let seq = Self::next_seq(&mut state);
            let mut record = edge_record(
                &format!("e{seq}"),
                request.source_node_id.as_str(),
                request.target_node_id.as_str(),
                request.edge_type,
            );
            record.label = request.label.clone();
            record.description = request.description.clone();
            if let Some(event) = &request.timeline_event_id {
                record.extra_data = Some(
                    json!({"timeline_event_id": event.0})
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                );
            }
            state.edges.push(record.clone());
            record
        };
        self.gate(Op::CreateEdge).await;
        Ok(record)
    }

    async fn update_edge(
        &self,
        id: &EdgeId,
        request: &UpdateEdgeRequest,
    ) -> Result<EdgeRecord, ApiError> {
        self.begin(Op::UpdateEdge, format!("update_edge:{id}")).await?;
        let mut state = self.state.lock();
        let record = state
            .edges
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| ApiError::from_status(404, "Edge not found"))?;
        if let Some(kind) = request.edge_type {
            record.edge_type = kind;
        }
        if let Some(label) = &request.label {
            record.label = Some(label.clone());
        }
        if let Some(technique) = &request.mitre_technique {
            record.mitre_technique = Some(technique.clone());
        }
        Ok(record.clone())
    }

    async fn delete_edge(&self, id: &EdgeId) -> Result<(), ApiError> {
        self.begin(Op::DeleteEdge, format!("delete_edge:{id}")).await?;
        let mut state = self.state.lock();
        let before = state.edges.len();
        state.edges.retain(|e| &e.id != id);
        if state.edges.len() == before {
            return Err(ApiError::from_status(404, "Edge not found"));
        }
        Ok(())
    }

    async fn auto_generate(
        &self,
        request: AutoGenerateRequest,
    ) -> Result<AutoGenerateResponse, ApiError> {
        self.begin(
            Op::AutoGenerate,
            format!("auto_generate:{}", request.clear_existing),
        ).await?;
        let mut state = self.state.lock();
        if request.clear_existing {
            state.nodes.clear();
            state.edges.clear();
        }
        let generated = std::mem::take(&mut state.generated);
        state.nodes.extend(generated.iter().cloned());
        Ok(AutoGenerateResponse {
            message: Some(format!("Generated {} nodes", generated.len())),
            nodes: generated,
            edges: Vec::new(),
        })
    }

    async fn fetch_timeline(&self) -> Result<Vec<TimelineEvent>, ApiError> {
        self.begin(Op::FetchTimeline, "fetch_timeline".into()).await?;
        let events = self.state.lock().timeline.clone();
        self.gate(Op::FetchTimeline).await;
        Ok(events)
    }

    async fn list_node_types(&self) -> Result<Vec<String>, ApiError> {
        Ok(NodeKind::KNOWN.iter().map(|k| k.as_str().to_string()).collect())
    }

    async fn list_edge_types(&self) -> Result<Vec<String>, ApiError> {
        Ok(EdgeKind::ALL.iter().map(|k| k.as_str().to_string()).collect())
    }
}

pub fn node_record(id: &str, kind: NodeKind) -> NodeRecord {
    NodeRecord {
        id: NodeId::new(id),
        node_type: kind,
        label: id.to_uppercase(),
        position_x: Some(0.0),
        position_y: Some(0.0),
        is_initial_access: Some(false),
        is_objective: Some(false),
        extra_data: None,
        correlation: None,
        compromised_host_id: None,
        compromised_account_id: None,
    }
}

pub fn edge_record(id: &str, source: &str, target: &str, kind: EdgeKind) -> EdgeRecord {
    EdgeRecord {
        id: EdgeId::new(id),
        source_node_id: NodeId::new(source),
        target_node_id: NodeId::new(target),
        edge_type: kind,
        label: None,
        mitre_tactic: None,
        mitre_technique: None,
        description: None,
        timestamp: None,
        extra_data: None,
    }
}

pub fn timeline_event(id: &str, activity: &str) -> TimelineEvent {
    TimelineEvent {
        id: EventId(id.into()),
        timestamp: Some("2026-03-02T10:15:00Z".into()),
        activity: activity.into(),
        hostname: None,
        mitre_tactic: None,
        mitre_technique: None,
    }
}

/// Lets spawned editor calls run until `done` holds.
pub async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn error_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Notify {
                severity: Severity::Error,
                message,
            } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
