//! Click-to-connect edge authoring.
//!
//! `Idle -> AwaitingSource -> AwaitingTarget -> Configuring`, then back to
//! `AwaitingSource` after a commit or cancel. Only `disable` returns to `Idle`.

use sheetstorm_api::CreateEdgeRequest;
use sheetstorm_core::{EdgeKind, EventId, GraphNode, NodeId, TimelineEvent};
use sheetstorm_events::DrawPhase;

/// Edge being configured before it is sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDraft {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub label: String,
    pub description: String,
    pub linked_event_id: Option<EventId>,
    /// `None` while the timeline is still loading.
    pub events: Option<Vec<TimelineEvent>>,
}

impl EdgeDraft {
    fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            kind: EdgeKind::default(),
            label: String::new(),
            description: String::new(),
            linked_event_id: None,
            events: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.events.is_none()
    }

    pub fn to_request(&self) -> CreateEdgeRequest {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        let mut request =
            CreateEdgeRequest::new(self.source.clone(), self.target.clone(), self.kind);
        request.label = non_empty(&self.label);
        request.description = non_empty(&self.description);
        request.timeline_event_id = self.linked_event_id.clone();
        request
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawMode {
    #[default]
    Idle,
    AwaitingSource,
    AwaitingTarget {
        source: NodeId,
    },
    Configuring(EdgeDraft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Draw mode is off; the click is a normal selection.
    NotDrawing,
    /// Node has no server id yet and cannot be an endpoint.
    Rejected,
    SourceSelected(NodeId),
    /// Second click on the source clears it.
    SourceCleared,
    /// Both endpoints chosen; the timeline should be fetched for the draft.
    TargetSelected { source: NodeId, target: NodeId },
    /// Clicks are ignored while the draft is open.
    Ignored,
}

impl DrawMode {
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DrawMode::Idle)
    }

    pub fn phase(&self) -> DrawPhase {
        match self {
            DrawMode::Idle => DrawPhase::Idle,
            DrawMode::AwaitingSource => DrawPhase::AwaitingSource,
            DrawMode::AwaitingTarget { source } => DrawPhase::AwaitingTarget {
                source: source.clone(),
            },
            DrawMode::Configuring(draft) => DrawPhase::Configuring {
                source: draft.source.clone(),
                target: draft.target.clone(),
            },
        }
    }

    pub fn draft(&self) -> Option<&EdgeDraft> {
        match self {
            DrawMode::Configuring(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EdgeDraft> {
        match self {
            DrawMode::Configuring(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn enable(&mut self) {
        if matches!(self, DrawMode::Idle) {
            *self = DrawMode::AwaitingSource;
        }
    }

    /// Leaves draw mode from any state, discarding the pending source.
    pub fn disable(&mut self) {
        *self = DrawMode::Idle;
    }

    pub fn click(&mut self, node: &GraphNode) -> ClickOutcome {
        if !self.is_drawing() {
            return ClickOutcome::NotDrawing;
        }
        let Some(id) = node.id.clone() else {
            return ClickOutcome::Rejected;
        };

        match self {
            DrawMode::Idle => ClickOutcome::NotDrawing,
            DrawMode::AwaitingSource => {
                *self = DrawMode::AwaitingTarget { source: id.clone() };
                ClickOutcome::SourceSelected(id)
            }
            DrawMode::AwaitingTarget { source } if *source == id => {
                *self = DrawMode::AwaitingSource;
                ClickOutcome::SourceCleared
            }
            DrawMode::AwaitingTarget { source } => {
                let source = source.clone();
                *self = DrawMode::Configuring(EdgeDraft::new(source.clone(), id.clone()));
                ClickOutcome::TargetSelected { source, target: id }
            }
            DrawMode::Configuring(_) => ClickOutcome::Ignored,
        }
    }

    /// Fills the event list of the open draft. Ignored if the user has moved
    /// on to a different pair (or left draw mode) since the fetch started.
    pub fn attach_events(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        events: Vec<TimelineEvent>,
    ) -> bool {
        match self {
            DrawMode::Configuring(draft)
                if draft.source == *source && draft.target == *target && draft.is_loading() =>
            {
                draft.events = Some(events);
                true
            }
            _ => false,
        }
    }

    /// Links a timeline event. The label is only filled from the event when
    /// the user has not typed one.
    pub fn select_event(&mut self, event_id: &EventId) -> bool {
        let Some(draft) = self.draft_mut() else {
            return false;
        };
        let Some(event) = draft
            .events
            .as_ref()
            .and_then(|events| events.iter().find(|e| &e.id == event_id))
        else {
            return false;
        };

        let suggestion = event.label_suggestion();
        if draft.label.trim().is_empty() {
            draft.label = suggestion;
        }
        draft.linked_event_id = Some(event_id.clone());
        true
    }

    pub fn clear_event(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.linked_event_id = None;
        }
    }

    pub fn set_kind(&mut self, kind: EdgeKind) -> bool {
        self.draft_mut().map(|d| d.kind = kind).is_some()
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        self.draft_mut().map(|d| d.label = label).is_some()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        let description = description.into();
        self.draft_mut().map(|d| d.description = description).is_some()
    }

    /// Moves the open draft out as a request and goes back to picking a
    /// source, so the same draft can only be sent once.
    pub fn take_request(&mut self) -> Option<CreateEdgeRequest> {
        let request = self.draft().map(EdgeDraft::to_request)?;
        *self = DrawMode::AwaitingSource;
        Some(request)
    }

    /// Back to picking a source; drops the draft and its event cache.
    pub fn cancel(&mut self) {
        if self.is_drawing() {
            *self = DrawMode::AwaitingSource;
        }
    }

    /// Drops a picked source or open draft that refers to `node`.
    pub fn forget_node(&mut self, node: &NodeId) -> bool {
        let stale = match self {
            DrawMode::AwaitingTarget { source } => source == node,
            DrawMode::Configuring(draft) => draft.source == *node || draft.target == *node,
            DrawMode::Idle | DrawMode::AwaitingSource => false,
        };
        if stale {
            *self = DrawMode::AwaitingSource;
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstorm_core::{LocalId, NodeKind, SyncState};

    fn persisted(local: u64, id: &str) -> GraphNode {
        let mut node = GraphNode::pending(LocalId(local), NodeKind::Workstation, id);
        node.id = Some(NodeId::new(id));
        node.state = SyncState::Confirmed;
        node
    }

    fn event(id: &str, activity: &str) -> TimelineEvent {
        TimelineEvent {
            id: EventId(id.into()),
            timestamp: None,
            activity: activity.into(),
            hostname: None,
            mitre_tactic: None,
            mitre_technique: None,
        }
    }

    fn configuring(a: &GraphNode, b: &GraphNode) -> DrawMode {
        let mut mode = DrawMode::default();
        mode.enable();
        mode.click(a);
        mode.click(b);
        mode
    }

    #[test]
    fn walks_through_to_configuring() {
        let h1 = persisted(1, "h1");
        let a1 = persisted(2, "a1");
        let mut mode = DrawMode::default();
        assert_eq!(mode.click(&h1), ClickOutcome::NotDrawing);

        mode.enable();
        assert_eq!(mode.phase(), DrawPhase::AwaitingSource);
        assert_eq!(mode.click(&h1), ClickOutcome::SourceSelected(NodeId::new("h1")));
        assert_eq!(
            mode.click(&a1),
            ClickOutcome::TargetSelected {
                source: NodeId::new("h1"),
                target: NodeId::new("a1"),
            }
        );
        let draft = mode.draft().unwrap();
        assert_eq!(draft.target, NodeId::new("a1"));
        assert!(draft.is_loading());
        assert_eq!(mode.click(&h1), ClickOutcome::Ignored);
    }

    #[test]
    fn clicking_source_twice_deselects() {
        let h1 = persisted(1, "h1");
        let mut mode = DrawMode::default();
        mode.enable();
        mode.click(&h1);
        assert_eq!(mode.click(&h1), ClickOutcome::SourceCleared);
        assert_eq!(mode, DrawMode::AwaitingSource);
    }

    #[test]
    fn pending_nodes_cannot_be_endpoints() {
        let pending = GraphNode::pending(LocalId(9), NodeKind::Malware, "new");
        let mut mode = DrawMode::default();
        mode.enable();
        assert_eq!(mode.click(&pending), ClickOutcome::Rejected);
        assert_eq!(mode, DrawMode::AwaitingSource);
    }

    #[test]
    fn late_events_for_another_pair_are_dropped() {
        let (h1, a1, m1) = (persisted(1, "h1"), persisted(2, "a1"), persisted(3, "m1"));
        let mut mode = configuring(&h1, &a1);
        mode.cancel();
        mode.click(&h1);
        mode.click(&m1);

        assert!(!mode.attach_events(&NodeId::new("h1"), &NodeId::new("a1"), vec![]));
        assert!(mode.draft().unwrap().is_loading());
        assert!(mode.attach_events(&NodeId::new("h1"), &NodeId::new("m1"), vec![]));
        assert!(!mode.draft().unwrap().is_loading());
    }

    #[test]
    fn label_is_filled_only_when_empty() {
        let (h1, a1) = (persisted(1, "h1"), persisted(2, "a1"));
        let mut mode = configuring(&h1, &a1);
        mode.attach_events(
            &NodeId::new("h1"),
            &NodeId::new("a1"),
            vec![event("e1", &"x".repeat(120)), event("e2", "RDP to DC")],
        );

        assert!(mode.select_event(&EventId("e1".into())));
        assert_eq!(mode.draft().unwrap().label.chars().count(), 80);

        assert!(mode.select_event(&EventId("e2".into())));
        let draft = mode.draft().unwrap();
        assert_eq!(draft.label, "x".repeat(80));
        assert_eq!(draft.linked_event_id, Some(EventId("e2".into())));

        mode.set_label("");
        mode.select_event(&EventId("e2".into()));
        assert_eq!(mode.draft().unwrap().label, "RDP to DC");
        assert!(!mode.select_event(&EventId("missing".into())));
    }

    #[test]
    fn request_carries_draft_fields() {
        let (h1, a1) = (persisted(1, "h1"), persisted(2, "a1"));
        let mut mode = configuring(&h1, &a1);
        mode.set_kind(EdgeKind::LateralMovement);
        mode.set_label("  psexec  ");

        let request = mode.take_request().unwrap();
        assert_eq!(request.source_node_id, NodeId::new("h1"));
        assert_eq!(request.edge_type, EdgeKind::LateralMovement);
        assert_eq!(request.label.as_deref(), Some("psexec"));
        assert!(request.description.is_none());
    }

    #[test]
    fn draft_is_taken_only_once() {
        let (h1, a1) = (persisted(1, "h1"), persisted(2, "a1"));
        let mut mode = configuring(&h1, &a1);
        assert!(mode.take_request().is_some());
        assert_eq!(mode, DrawMode::AwaitingSource);
        assert!(mode.take_request().is_none());
    }

    #[test]
    fn forgetting_an_endpoint_drops_source_and_draft() {
        let (h1, a1, m1) = (persisted(1, "h1"), persisted(2, "a1"), persisted(3, "m1"));
        let mut mode = DrawMode::default();
        mode.enable();
        mode.click(&h1);
        assert!(!mode.forget_node(&NodeId::new("a1")));
        assert!(mode.forget_node(&NodeId::new("h1")));
        assert_eq!(mode, DrawMode::AwaitingSource);

        let mut mode = configuring(&a1, &m1);
        assert!(mode.forget_node(&NodeId::new("m1")));
        assert!(mode.draft().is_none());
    }

    #[test]
    fn disable_returns_to_idle_from_anywhere() {
        let (h1, a1) = (persisted(1, "h1"), persisted(2, "a1"));
        let mut mode = configuring(&h1, &a1);
        mode.disable();
        assert_eq!(mode, DrawMode::Idle);
        mode.cancel();
        assert_eq!(mode, DrawMode::Idle);
    }
}
