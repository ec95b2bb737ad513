use crate::draw::{ClickOutcome, DrawMode, EdgeDraft};
use crate::export::GraphExporter;
use parking_lot::Mutex;
use sheetstorm_api::{
    ApiError, AutoGenerateRequest, CreateNodeRequest, EdgeRecord, NodeRecord, UpdateEdgeRequest,
    UpdateNodeRequest,
};
use sheetstorm_client::AttackGraphApi;
use sheetstorm_core::{
    EdgeId, EdgeKind, EventId, GraphEdge, GraphNode, LocalId, LocalIdAllocator, NodeId, NodeKind,
    Position, SyncState,
};
use sheetstorm_events::{DrawPhase, Event, EventBus, Selection};
use sheetstorm_graph::{
    GraphConverter, GraphModel, HubSatelliteLayouter, Inspection, Jitter, Layouter,
    inspect_edge, inspect_node,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteFailure {
    pub target: DeleteTarget,
    pub error: ApiError,
}

/// Outcome of a delete. Local removal always happens; server failures are
/// listed here and leave the editor flagged as drifted until the next reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    pub removed_nodes: usize,
    pub removed_edges: usize,
    pub failures: Vec<DeleteFailure>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct EditorState {
    model: GraphModel,
    draw: DrawMode,
    selection: Selection,
    /// Local copy diverged from the server after a failed delete.
    drift: bool,
    /// Pending entities the user removed before the server answered.
    discarded: HashSet<LocalId>,
}

/// Headless attack graph editor for one incident.
///
/// Holds the working copy of the graph and keeps it in sync with the server.
/// The lock is never held across an `.await`, so calls may overlap and
/// settle in any order.
#[derive(Clone)]
pub struct AttackGraphEditor {
    api: Arc<dyn AttackGraphApi>,
    state: Arc<Mutex<EditorState>>,
    ids: Arc<LocalIdAllocator>,
    events: EventBus,
    reload_generation: Arc<AtomicU64>,
    auto_generated: Arc<AtomicBool>,
}

impl AttackGraphEditor {
    pub fn new(api: Arc<dyn AttackGraphApi>) -> Self {
        Self::with_event_bus(api, EventBus::new())
    }

    pub fn with_event_bus(api: Arc<dyn AttackGraphApi>, events: EventBus) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(EditorState {
                model: GraphModel::new(),
                draw: DrawMode::Idle,
                selection: Selection::None,
                drift: false,
                discarded: HashSet::new(),
            })),
            ids: Arc::new(LocalIdAllocator::new()),
            events,
            reload_generation: Arc::new(AtomicU64::new(0)),
            auto_generated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn notify_error(&self, context: &str, error: &ApiError) {
        tracing::warn!("{context}: {error}");
        self.events.publish(Event::error(format!("{context}: {}", error.message)));
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> GraphModel {
        self.state.lock().model.clone()
    }

    pub fn nodes(&self) -> Vec<GraphNode> {
        self.state.lock().model.nodes().to_vec()
    }

    pub fn edges(&self) -> Vec<GraphEdge> {
        self.state.lock().model.edges().to_vec()
    }

    pub fn node_by_id(&self, id: &NodeId) -> Option<GraphNode> {
        self.state.lock().model.node_by_id(id).cloned()
    }

    pub fn has_drift(&self) -> bool {
        self.state.lock().drift
    }

    /// Pending entities deleted locally whose create call has not settled.
    pub fn awaiting_discard(&self) -> usize {
        self.state.lock().discarded.len()
    }

    pub fn draw_phase(&self) -> DrawPhase {
        self.state.lock().draw.phase()
    }

    pub fn draft(&self) -> Option<EdgeDraft> {
        self.state.lock().draw.draft().cloned()
    }

    pub fn selection(&self) -> Selection {
        self.state.lock().selection
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Initial fetch. An empty graph triggers one auto-generation per editor.
    pub async fn load(&self) -> Result<(), ApiError> {
        let applied = self.reload().await?;
        let empty = self.state.lock().model.is_empty();
        if applied && empty && !self.auto_generated.swap(true, Ordering::SeqCst) {
            tracing::info!("Attack graph is empty, generating from incident data");
            self.regenerate(false).await?;
        }
        Ok(())
    }

    /// Replaces the local graph with the server's. Returns `false` when a
    /// newer reload was started meanwhile and this response was discarded.
    pub async fn reload(&self) -> Result<bool, ApiError> {
        let generation = self.reload_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let snapshot = match self.api.fetch_graph().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.notify_error("Failed to load attack graph", &e);
                return Err(e);
            }
        };

        if self.reload_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale attack graph response (generation {generation})");
            return Ok(false);
        }

        let graph = GraphConverter::from_snapshot(&snapshot, &self.ids);
        let (nodes, edges) = (graph.nodes.len(), graph.edges.len());
        {
            let mut state = self.state.lock();
            state.model.replace(graph);
            state.drift = false;
            state.selection = Selection::None;
        }
        tracing::info!("Loaded attack graph: {nodes} nodes, {edges} edges");
        self.events.publish(Event::GraphReloaded { nodes, edges });
        Ok(true)
    }

    /// Asks the server to rebuild the graph from incident data, then reloads.
    pub async fn regenerate(&self, clear_existing: bool) -> Result<(), ApiError> {
        let response = match self
            .api
            .auto_generate(AutoGenerateRequest { clear_existing })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.notify_error("Failed to generate attack graph", &e);
                return Err(e);
            }
        };

        let (nodes, edges) = (response.nodes.len(), response.edges.len());
        tracing::info!("Auto-generated {nodes} nodes, {edges} edges");
        self.events.publish(Event::GraphRegenerated { nodes, edges });
        self.events.publish(Event::success(
            response
                .message
                .unwrap_or_else(|| format!("Generated {nodes} nodes and {edges} edges")),
        ));
        self.reload().await.map(|_| ())
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Shows the node immediately under a placeholder id and confirms it
    /// when the server answers. A rejected node stays, marked failed.
    pub async fn create_node_optimistic(
        &self,
        kind: NodeKind,
        label: impl Into<String>,
        position: Position,
    ) -> Result<LocalId, ApiError> {
        let local_id = self.ids.next_id();
        let mut node = GraphNode::pending(local_id, kind.clone(), label);
        node.position = position;
        let request = CreateNodeRequest::new(kind, node.label.clone(), position);
        self.state.lock().model.push_node(node);

        match self.api.create_node(&request).await {
            Ok(record) => {
                self.reconcile_node(local_id, record).await;
                Ok(local_id)
            }
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    state.model.mark_node_failed(local_id);
                    state.discarded.remove(&local_id);
                }
                self.events.publish(Event::NodeCreateFailed { local_id });
                self.notify_error("Failed to create node", &e);
                Err(e)
            }
        }
    }

    /// Waits for the server before adding anything locally.
    pub async fn create_node(&self, request: CreateNodeRequest) -> Result<LocalId, ApiError> {
        let record = match self.api.create_node(&request).await {
            Ok(record) => record,
            Err(e) => {
                self.notify_error("Failed to create node", &e);
                return Err(e);
            }
        };

        let node = GraphConverter::convert_node(&record, &self.ids);
        let local_id = node.local_id;
        {
            let mut state = self.state.lock();
            if let Some(existing) = state.model.node_by_id(&record.id) {
                return Ok(existing.local_id);
            }
            state.model.push_node(node);
        }
        self.events.publish(Event::NodeConfirmed {
            local_id,
            id: record.id,
        });
        Ok(local_id)
    }

    async fn reconcile_node(&self, local_id: LocalId, record: NodeRecord) {
        enum Outcome {
            /// Carries the position if the node was moved while pending.
            Confirmed(Option<Position>),
            Discarded,
            Known,
            Appended(LocalId),
        }

        let outcome = {
            let mut state = self.state.lock();
            if state.discarded.remove(&local_id) {
                Outcome::Discarded
            } else if state.model.confirm_node(local_id, record.id.clone()) {
                let sent = record.position();
                let moved = state
                    .model
                    .node(local_id)
                    .map(|n| n.position)
                    .filter(|position| *position != sent);
                Outcome::Confirmed(moved)
            } else if state.model.node_by_id(&record.id).is_some() {
                Outcome::Known
            } else {
                let node = GraphConverter::convert_node(&record, &self.ids);
                let appended = node.local_id;
                state.model.push_node(node);
                Outcome::Appended(appended)
            }
        };

        match outcome {
            Outcome::Confirmed(moved) => {
                if let Some(position) = moved {
                    let _ = self.persist_position(record.id.clone(), position);
                }
                self.events.publish(Event::NodeConfirmed {
                    local_id,
                    id: record.id,
                });
            }
            Outcome::Appended(appended) => self.events.publish(Event::NodeConfirmed {
                local_id: appended,
                id: record.id,
            }),
            Outcome::Known => {}
            Outcome::Discarded => {
                tracing::debug!("Node {} was deleted before it was saved", record.id);
                match self.api.delete_node(&record.id).await {
                    Ok(()) => {}
                    Err(e) if e.code == "not_found" => {
                        tracing::debug!("Discarded node {} is already gone", record.id);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to remove discarded node {}: {e}", record.id);
                        self.state.lock().drift = true;
                    }
                }
            }
        }
    }

    /// Moves a node locally and, if it is persisted, writes the position in
    /// the background. Write failures are logged and otherwise ignored.
    pub fn move_node(&self, local_id: LocalId, position: Position) -> Option<JoinHandle<()>> {
        let id = {
            let mut state = self.state.lock();
            if !state.model.set_position(local_id, position) {
                return None;
            }
            state.model.node(local_id).and_then(|n| n.id.clone())
        }?;
        self.persist_position(id, position)
    }

    fn persist_position(&self, id: NodeId, position: Position) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, position of {id} not saved");
            return None;
        };
        let api = Arc::clone(&self.api);
        Some(runtime.spawn(async move {
            if let Err(e) = api
                .update_node(&id, &UpdateNodeRequest::position(position))
                .await
            {
                tracing::debug!("Failed to save position of {id}: {e}");
            }
        }))
    }

    pub async fn update_node(
        &self,
        local_id: LocalId,
        request: UpdateNodeRequest,
    ) -> Result<(), ApiError> {
        let id = self.require_node_id(local_id)?;
        let record = match self.api.update_node(&id, &request).await {
            Ok(record) => record,
            Err(e) => {
                self.notify_error("Failed to update node", &e);
                return Err(e);
            }
        };

        let mut state = self.state.lock();
        if let Some(node) = state.model.node_mut(local_id) {
            node.position = record.position();
            node.kind = record.node_type.clone();
            node.role = record.node_type.role();
            node.label = record.label;
            node.is_initial_access = record.is_initial_access.unwrap_or(false);
            node.is_objective = record.is_objective.unwrap_or(false);
            node.metadata = record.extra_data.unwrap_or_default();
        }
        Ok(())
    }

    fn require_node_id(&self, local_id: LocalId) -> Result<NodeId, ApiError> {
        let state = self.state.lock();
        let node = state
            .model
            .node(local_id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown node {local_id}")))?;
        node.id
            .clone()
            .ok_or_else(|| ApiError::invalid_argument(format!("Node {local_id} is not saved yet")))
    }

    /// Removes the nodes and their edges locally, then deletes them on the
    /// server one by one. Server failures do not restore anything.
    pub async fn delete_nodes(&self, local_ids: &[LocalId]) -> DeleteReport {
        let (removed, draw_phase) = {
            let mut state = self.state.lock();
            let removed = state.model.remove_nodes(local_ids);
            for node in removed.nodes.iter().filter(|n| n.state == SyncState::Pending) {
                state.discarded.insert(node.local_id);
            }
            for edge in removed.edges.iter().filter(|e| e.state == SyncState::Pending) {
                state.discarded.insert(edge.local_id);
            }
            let gone = match state.selection {
                Selection::None => false,
                Selection::Node(id) => removed.nodes.iter().any(|n| n.local_id == id),
                Selection::Edge(id) => removed.edges.iter().any(|e| e.local_id == id),
            };
            if gone {
                state.selection = Selection::None;
            }
            let mut draw_reset = false;
            for id in removed.nodes.iter().filter_map(|n| n.id.as_ref()) {
                draw_reset |= state.draw.forget_node(id);
            }
            let draw_phase = draw_reset.then(|| state.draw.phase());
            (removed, draw_phase)
        };
        if let Some(phase) = draw_phase {
            self.publish_phase(phase);
        }

        let mut report = DeleteReport {
            removed_nodes: removed.nodes.len(),
            removed_edges: removed.edges.len(),
            failures: Vec::new(),
        };
        for id in removed.edges.iter().filter_map(|e| e.id.clone()) {
            if let Err(error) = self.api.delete_edge(&id).await {
                report.failures.push(DeleteFailure {
                    target: DeleteTarget::Edge(id),
                    error,
                });
            }
        }
        for id in removed.nodes.iter().filter_map(|n| n.id.clone()) {
            if let Err(error) = self.api.delete_node(&id).await {
                report.failures.push(DeleteFailure {
                    target: DeleteTarget::Node(id),
                    error,
                });
            }
        }

        self.finish_delete(&report);
        self.events.publish(Event::NodesDeleted {
            nodes: report.removed_nodes,
            edges: report.removed_edges,
            failures: report.failures.len(),
        });
        report
    }

    pub async fn delete_edges(&self, local_ids: &[LocalId]) -> DeleteReport {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.model.remove_edges(local_ids);
            for edge in removed.iter().filter(|e| e.state == SyncState::Pending) {
                state.discarded.insert(edge.local_id);
            }
            let selected = state.selection;
            if matches!(selected, Selection::Edge(id) if removed.iter().any(|e| e.local_id == id)) {
                state.selection = Selection::None;
            }
            removed
        };

        let mut report = DeleteReport {
            removed_nodes: 0,
            removed_edges: removed.len(),
            failures: Vec::new(),
        };
        for id in removed.into_iter().filter_map(|e| e.id) {
            if let Err(error) = self.api.delete_edge(&id).await {
                report.failures.push(DeleteFailure {
                    target: DeleteTarget::Edge(id),
                    error,
                });
            }
        }

        self.finish_delete(&report);
        self.events.publish(Event::EdgesDeleted {
            edges: report.removed_edges,
            failures: report.failures.len(),
        });
        report
    }

    fn finish_delete(&self, report: &DeleteReport) {
        if report.is_clean() {
            return;
        }
        for failure in &report.failures {
            tracing::warn!("Delete of {:?} failed: {}", failure.target, failure.error);
        }
        self.state.lock().drift = true;
        self.events.publish(Event::error(format!(
            "Failed to delete {} item(s); reload to see the server state",
            report.failures.len()
        )));
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Drag-to-connect: an association edge between two saved nodes, shown
    /// at once and confirmed when the server answers. A failure reloads the
    /// whole graph.
    pub async fn connect(&self, source: &NodeId, target: &NodeId) -> Result<EdgeId, ApiError> {
        let local_id = {
            let mut state = self.state.lock();
            if state.model.node_by_id(source).is_none() || state.model.node_by_id(target).is_none()
            {
                return Err(ApiError::invalid_argument(
                    "Both endpoints must be saved nodes",
                ));
            }
            let local_id = self.ids.next_id();
            state.model.push_edge(GraphEdge::pending(
                local_id,
                source.clone(),
                target.clone(),
                EdgeKind::AssociatedWith,
            ));
            local_id
        };

        let request = sheetstorm_api::CreateEdgeRequest::new(
            source.clone(),
            target.clone(),
            EdgeKind::AssociatedWith,
        );
        match self.api.create_edge(&request).await {
            Ok(record) => {
                let id = record.id.clone();
                self.reconcile_edge(local_id, record).await;
                Ok(id)
            }
            Err(e) => {
                self.state.lock().model.remove_edges(&[local_id]);
                self.notify_error("Failed to create connection", &e);
                // Server state is the truth; errors here are already notified.
                let _ = self.reload().await;
                Err(e)
            }
        }
    }

    /// Promotes the pending edge created under `local_id`. If a reload
    /// replaced it meanwhile, the server edge is appended unless the reload
    /// already brought it in.
    async fn reconcile_edge(&self, local_id: LocalId, record: EdgeRecord) {
        enum Outcome {
            Confirmed(LocalId),
            Discarded,
            Known,
        }

        let outcome = {
            let mut state = self.state.lock();
            if state.discarded.remove(&local_id) {
                Outcome::Discarded
            } else if state.model.confirm_edge(local_id, record.id.clone()) {
                Outcome::Confirmed(local_id)
            } else if state.model.edge_by_id(&record.id).is_some() {
                Outcome::Known
            } else {
                let edge = GraphConverter::convert_edge(&record, &self.ids);
                let appended = edge.local_id;
                if state.model.push_edge(edge) {
                    Outcome::Confirmed(appended)
                } else {
                    Outcome::Known
                }
            }
        };

        match outcome {
            Outcome::Confirmed(local_id) => self.events.publish(Event::EdgeConfirmed {
                local_id,
                id: record.id,
            }),
            Outcome::Known => {}
            Outcome::Discarded => {
                tracing::debug!("Edge {} was deleted before it was saved", record.id);
                match self.api.delete_edge(&record.id).await {
                    Ok(()) => {}
                    // Deleting an endpoint already took it down on the server.
                    Err(e) if e.code == "not_found" => {
                        tracing::debug!("Discarded edge {} is already gone", record.id);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to remove discarded edge {}: {e}", record.id);
                        self.state.lock().drift = true;
                    }
                }
            }
        }
    }

    pub async fn update_edge(
        &self,
        local_id: LocalId,
        request: UpdateEdgeRequest,
    ) -> Result<(), ApiError> {
        let id = {
            let state = self.state.lock();
            let edge = state
                .model
                .edge(local_id)
                .ok_or_else(|| ApiError::not_found(format!("Unknown edge {local_id}")))?;
            edge.id.clone().ok_or_else(|| {
                ApiError::invalid_argument(format!("Edge {local_id} is not saved yet"))
            })?
        };

        let record = match self.api.update_edge(&id, &request).await {
            Ok(record) => record,
            Err(e) => {
                self.notify_error("Failed to update edge", &e);
                return Err(e);
            }
        };

        let mut state = self.state.lock();
        if let Some(edge) = state.model.edge_mut(local_id) {
            edge.kind = record.edge_type;
            edge.label = record.label.clone();
            edge.mitre_tactic = record.mitre_tactic.clone();
            edge.mitre_technique = record.mitre_technique.clone();
            edge.description = record.description.clone();
            edge.linked_event_id = record.linked_event_id();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Draw mode
    // ------------------------------------------------------------------

    fn publish_phase(&self, phase: DrawPhase) {
        self.events.publish(Event::DrawStateChanged(phase));
    }

    pub fn enable_draw(&self) {
        let phase = {
            let mut state = self.state.lock();
            state.draw.enable();
            state.selection = Selection::None;
            state.draw.phase()
        };
        self.publish_phase(phase);
    }

    pub fn disable_draw(&self) {
        let phase = {
            let mut state = self.state.lock();
            state.draw.disable();
            state.draw.phase()
        };
        self.publish_phase(phase);
    }

    pub fn cancel_draw(&self) {
        let phase = {
            let mut state = self.state.lock();
            state.draw.cancel();
            state.draw.phase()
        };
        self.publish_phase(phase);
    }

    /// Routes a node click to draw mode when it is on, otherwise selects the
    /// node. Picking a target loads the incident timeline for the draft.
    pub async fn click_node(&self, local_id: LocalId) -> ClickOutcome {
        let (outcome, phase) = {
            let mut state = self.state.lock();
            let Some(node) = state.model.node(local_id).cloned() else {
                return ClickOutcome::Ignored;
            };
            let outcome = state.draw.click(&node);
            if outcome == ClickOutcome::NotDrawing {
                state.selection = Selection::Node(local_id);
            }
            (outcome, state.draw.phase())
        };

        match &outcome {
            ClickOutcome::NotDrawing => {
                self.events
                    .publish(Event::SelectionChanged(Selection::Node(local_id)));
            }
            ClickOutcome::Rejected | ClickOutcome::Ignored => {}
            ClickOutcome::SourceSelected(_) | ClickOutcome::SourceCleared => {
                self.publish_phase(phase);
            }
            ClickOutcome::TargetSelected { source, target } => {
                self.publish_phase(phase);
                self.load_draft_events(source, target).await;
            }
        }
        outcome
    }

    async fn load_draft_events(&self, source: &NodeId, target: &NodeId) {
        let events = match self.api.fetch_timeline().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Failed to load timeline events: {e}");
                self.events
                    .publish(Event::warning("Timeline events could not be loaded"));
                Vec::new()
            }
        };
        if !self.state.lock().draw.attach_events(source, target, events) {
            tracing::debug!("Draft changed while timeline was loading, dropping events");
        }
    }

    /// Edges are only selectable outside draw mode.
    pub fn click_edge(&self, local_id: LocalId) -> bool {
        {
            let mut state = self.state.lock();
            if state.draw.is_drawing() || state.model.edge(local_id).is_none() {
                return false;
            }
            state.selection = Selection::Edge(local_id);
        }
        self.events
            .publish(Event::SelectionChanged(Selection::Edge(local_id)));
        true
    }

    pub fn clear_selection(&self) {
        self.state.lock().selection = Selection::None;
        self.events.publish(Event::SelectionChanged(Selection::None));
    }

    pub fn inspect_selection(&self) -> Option<Inspection> {
        let state = self.state.lock();
        match state.selection {
            Selection::None => None,
            Selection::Node(id) => state.model.node(id).map(inspect_node),
            Selection::Edge(id) => state
                .model
                .edge(id)
                .map(|edge| inspect_edge(edge, state.model.nodes())),
        }
    }

    pub fn set_draft_kind(&self, kind: EdgeKind) -> bool {
        self.state.lock().draw.set_kind(kind)
    }

    pub fn set_draft_label(&self, label: impl Into<String>) -> bool {
        self.state.lock().draw.set_label(label)
    }

    pub fn set_draft_description(&self, description: impl Into<String>) -> bool {
        self.state.lock().draw.set_description(description)
    }

    pub fn select_draft_event(&self, event_id: &EventId) -> bool {
        self.state.lock().draw.select_event(event_id)
    }

    /// Sends the configured draft. Draw mode goes back to picking a source
    /// before the request leaves, so a repeated commit finds no draft.
    pub async fn commit_edge(&self) -> Result<EdgeId, ApiError> {
        let (request, phase) = {
            let mut state = self.state.lock();
            let Some(request) = state.draw.take_request() else {
                return Err(ApiError::invalid_argument(
                    "Pick a source and a target before saving the connection",
                ));
            };
            (request, state.draw.phase())
        };
        self.publish_phase(phase);

        match self.api.create_edge(&request).await {
            Ok(record) => {
                self.events.publish(Event::success("Connection created"));
                // Reload errors are notified by reload itself.
                let _ = self.reload().await;
                Ok(record.id)
            }
            Err(e) => {
                self.notify_error("Failed to create connection", &e);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Layout, lookups, export
    // ------------------------------------------------------------------

    /// Repositions every node and saves each persisted one in the background.
    pub fn auto_layout(&self, jitter: Jitter) -> Vec<JoinHandle<()>> {
        let to_persist: Vec<(NodeId, Position)> = {
            let mut state = self.state.lock();
            let layout =
                HubSatelliteLayouter::new(jitter).execute(state.model.nodes(), state.model.edges());
            let mut to_persist = Vec::new();
            for (local_id, position) in layout {
                state.model.set_position(local_id, position);
                if let Some(id) = state.model.node(local_id).and_then(|n| n.id.clone()) {
                    to_persist.push((id, position));
                }
            }
            to_persist
        };

        let handles = to_persist
            .into_iter()
            .filter_map(|(id, position)| self.persist_position(id, position))
            .collect();
        self.events.publish(Event::FitView);
        handles
    }

    pub async fn node_types(&self) -> Result<Vec<String>, ApiError> {
        self.api.list_node_types().await.inspect_err(|e| {
            self.notify_error("Failed to load node types", e);
        })
    }

    pub async fn edge_types(&self) -> Result<Vec<String>, ApiError> {
        self.api.list_edge_types().await.inspect_err(|e| {
            self.notify_error("Failed to load edge types", e);
        })
    }

    /// Without an exporter the request only produces a notification.
    pub fn export(&self, exporter: Option<&dyn GraphExporter>) -> Option<Vec<u8>> {
        let Some(exporter) = exporter else {
            self.events
                .publish(Event::info("Export is not available in this environment"));
            return None;
        };
        let result = {
            let state = self.state.lock();
            exporter.export(state.model.nodes(), state.model.edges())
        };
        match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                self.notify_error("Failed to export attack graph", &e);
                None
            }
        }
    }
}
