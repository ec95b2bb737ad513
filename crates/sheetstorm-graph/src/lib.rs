pub mod converter;
pub mod inspect;
pub mod layout;
pub mod model;
pub mod style;

pub use converter::{GraphConverter, RenderGraph};
pub use inspect::{Badge, Field, Inspection, inspect_edge, inspect_node};
pub use layout::{HubSatelliteLayouter, Jitter, LayoutResult, Layouter};
pub use model::{GraphModel, Removed};
pub use style::{
    Color, EdgeStyle, NodeColors, NodeShape, NodeStyle, ThemeMode, edge_style, node_style,
    node_style_for_state,
};
