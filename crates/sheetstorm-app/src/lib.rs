//! Attack graph editing on top of the incident REST API.
//!
//! [`AttackGraphEditor`] is the entry point. It is headless: any shell (CLI,
//! desktop, web bridge) drives it and listens on its event bus.

pub mod draw;
pub mod editor;
pub mod export;

pub use draw::{ClickOutcome, DrawMode, EdgeDraft};
pub use editor::{AttackGraphEditor, DeleteFailure, DeleteReport, DeleteTarget};
pub use export::{GraphExporter, JsonExporter};
