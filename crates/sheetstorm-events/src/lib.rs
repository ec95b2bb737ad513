use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use sheetstorm_core::{EdgeId, LocalId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Coarse draw-mode phase, published whenever the authoring state machine moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPhase {
    Idle,
    AwaitingSource,
    AwaitingTarget { source: NodeId },
    Configuring { source: NodeId, target: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Node(LocalId),
    Edge(LocalId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// User-facing toast.
    Notify { severity: Severity, message: String },

    // Graph
    GraphReloaded { nodes: usize, edges: usize },
    GraphRegenerated { nodes: usize, edges: usize },
    NodeConfirmed { local_id: LocalId, id: NodeId },
    NodeCreateFailed { local_id: LocalId },
    EdgeConfirmed { local_id: LocalId, id: EdgeId },
    NodesDeleted { nodes: usize, edges: usize, failures: usize },
    EdgesDeleted { edges: usize, failures: usize },

    // View
    FitView,
    SelectionChanged(Selection),
    DrawStateChanged(DrawPhase),
}

impl Event {
    pub fn info(message: impl Into<String>) -> Self {
        Event::Notify {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Event::Notify {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Event::Notify {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::Notify {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Unbounded queue of editor events. The host is expected to `drain` or
/// `dispatch_to` regularly; nothing is dropped on its behalf.
#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        if let Event::Notify { severity, message } = &event {
            tracing::debug!("notify [{severity:?}] {message}");
        }
        let _ = self.tx.send(event);
    }

    /// Everything published so far, without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let receiver = bus.receiver();

        bus.publish(Event::NodeConfirmed {
            local_id: LocalId(3),
            id: NodeId::new("n3"),
        });

        match receiver.recv().unwrap() {
            Event::NodeConfirmed { local_id, id } => {
                assert_eq!(local_id, LocalId(3));
                assert_eq!(id.as_str(), "n3");
            }
            other => panic!("Expected NodeConfirmed, got {other:?}"),
        }
    }

    #[test]
    fn test_drain_empties_the_queue() {
        let bus = EventBus::new();
        let clone = bus.clone();
        bus.publish(Event::FitView);
        clone.publish(Event::info("Export is not available in this environment"));

        assert_eq!(bus.drain().len(), 2);
        assert!(clone.drain().is_empty());
    }

    #[test]
    fn test_dispatch_drains_in_order() {
        struct Recorder(Vec<Event>);
        impl EventListener for Recorder {
            fn handle_event(&mut self, event: &Event) {
                self.0.push(event.clone());
            }
        }

        let bus = EventBus::new();
        bus.publish(Event::error("Failed to create connection"));
        bus.publish(Event::FitView);

        let mut recorder = Recorder(Vec::new());
        bus.dispatch_to(&mut recorder);
        assert_eq!(
            recorder.0,
            vec![
                Event::Notify {
                    severity: Severity::Error,
                    message: "Failed to create connection".into(),
                },
                Event::FitView,
            ]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_draw_phase_serializes() {
        let json = serde_json::to_string(&Event::DrawStateChanged(DrawPhase::AwaitingSource))
            .unwrap();
        assert_eq!(json, r#"{"DrawStateChanged":"AwaitingSource"}"#);
    }
}
