use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sheetstorm_core::{GraphEdge, GraphNode, LocalId, NodeId, Position};
use std::collections::HashMap;

/// New positions keyed by local id. Every input node gets exactly one entry.
pub type LayoutResult = HashMap<LocalId, Position>;

pub trait Layouter {
    fn execute(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> LayoutResult;
}

/// Angular noise added to satellite placement so siblings never overlap exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    Disabled,
    /// Reproducible noise, for tests and the CLI `--seed` flag.
    Seeded { seed: u64, amplitude: f64 },
    Random { amplitude: f64 },
}

impl Default for Jitter {
    fn default() -> Self {
        Jitter::Random {
            amplitude: HubSatelliteLayouter::DEFAULT_JITTER,
        }
    }
}

impl Jitter {
    fn rng(&self) -> Option<(StdRng, f64)> {
        match *self {
            Jitter::Disabled => None,
            Jitter::Seeded { seed, amplitude } => Some((StdRng::seed_from_u64(seed), amplitude)),
            Jitter::Random { amplitude } => Some((StdRng::from_entropy(), amplitude)),
        }
    }
}

/// Grid of hubs (hosts and domain controllers) with satellites orbiting the
/// hub they are connected to. Anything not attached to a hub goes on a
/// secondary grid below.
///
/// Not force-directed: one pass, no iteration.
#[derive(Debug, Clone, Default)]
pub struct HubSatelliteLayouter {
    pub jitter: Jitter,
}

impl HubSatelliteLayouter {
    pub const HUB_COLUMNS: usize = 4;
    pub const HUB_SPACING: f64 = 350.0;
    pub const HUB_ORIGIN: Position = Position::new(300.0, 200.0);

    pub const SATELLITE_RADIUS: f64 = 180.0;
    pub const SATELLITE_ANGLE_STEP: f64 = 0.8;
    /// Radians.
    pub const DEFAULT_JITTER: f64 = 0.3;

    pub const ORPHAN_COLUMNS: usize = 6;
    pub const ORPHAN_SPACING_X: f64 = 200.0;
    pub const ORPHAN_SPACING_Y: f64 = 150.0;
    pub const ORPHAN_ORIGIN: Position = Position::new(100.0, 600.0);

    pub fn new(jitter: Jitter) -> Self {
        Self { jitter }
    }

    pub fn deterministic() -> Self {
        Self::new(Jitter::Disabled)
    }

    fn hub_slot(index: usize) -> Position {
        let col = (index % Self::HUB_COLUMNS) as f64;
        let row = (index / Self::HUB_COLUMNS) as f64;
        Self::HUB_ORIGIN.offset(col * Self::HUB_SPACING, row * Self::HUB_SPACING)
    }

    fn orphan_slot(index: usize) -> Position {
        let col = (index % Self::ORPHAN_COLUMNS) as f64;
        let row = (index / Self::ORPHAN_COLUMNS) as f64;
        Self::ORPHAN_ORIGIN.offset(col * Self::ORPHAN_SPACING_X, row * Self::ORPHAN_SPACING_Y)
    }

    /// For each node id, the ids of its neighbours in edge order.
    fn adjacency(edges: &[GraphEdge]) -> HashMap<&NodeId, Vec<&NodeId>> {
        let mut index: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for edge in edges {
            index.entry(&edge.source).or_default().push(&edge.target);
            index.entry(&edge.target).or_default().push(&edge.source);
        }
        index
    }
}

impl Layouter for HubSatelliteLayouter {
    fn execute(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> LayoutResult {
        let mut result = LayoutResult::with_capacity(nodes.len());

        let (mut hubs, satellites): (Vec<&GraphNode>, Vec<&GraphNode>) =
            nodes.iter().partition(|n| n.role.is_hub());
        // Stable: keeps input order within each group.
        hubs.sort_by_key(|n| !n.is_initial_access);

        let mut hub_positions: HashMap<&NodeId, Position> = HashMap::new();
        for (index, hub) in hubs.iter().enumerate() {
            let position = Self::hub_slot(index);
            result.insert(hub.local_id, position);
            if let Some(id) = &hub.id {
                hub_positions.insert(id, position);
            }
        }

        let adjacency = Self::adjacency(edges);
        let mut rng = self.jitter.rng();
        let mut siblings: HashMap<&NodeId, usize> = HashMap::new();
        let mut orphans = 0usize;

        for satellite in satellites {
            let hub = satellite
                .id
                .as_ref()
                .and_then(|id| adjacency.get(id))
                .and_then(|neighbours| {
                    neighbours
                        .iter()
                        .find_map(|n| hub_positions.get(n).map(|pos| (*n, *pos)))
                });

            let position = match hub {
                Some((hub_id, center)) => {
                    let index = siblings.entry(hub_id).or_insert(0);
                    let noise = match rng.as_mut() {
                        Some((rng, amplitude)) if *amplitude > 0.0 => {
                            rng.gen_range(-*amplitude..=*amplitude)
                        }
                        _ => 0.0,
                    };
                    let angle = *index as f64 * Self::SATELLITE_ANGLE_STEP + noise;
                    *index += 1;
                    center.offset(
                        Self::SATELLITE_RADIUS * angle.cos(),
                        Self::SATELLITE_RADIUS * angle.sin(),
                    )
                }
                None => {
                    let position = Self::orphan_slot(orphans);
                    orphans += 1;
                    position
                }
            };
            result.insert(satellite.local_id, position);
        }

        tracing::debug!(
            "Laid out {} hubs, {} satellites, {} orphans",
            hubs.len(),
            nodes.len() - hubs.len() - orphans,
            orphans
        );
        result
    }
}
