//! Graph state & synthesis reconciliation engine.
//!
//! Framework-free core of the app: the canonical node/edge store, the
//! selection coordinator, the pending-connection protocol, the suggestion
//! fetch lifecycle and the synthesis merge/fork logic. The Leptos view layer
//! and the HTTP client adapt to this module at its boundary, never the other
//! way around.

pub mod connection;
pub mod ident;
pub mod persistence;
pub mod selection;
pub mod store;
pub mod suggestions;
pub mod synthesis;
pub mod types;

pub use connection::PendingConnection;
pub use selection::{FetchPlan, Selection};
pub use store::{CanvasStore, Connection, EdgeChange, EdgeDraft, NodeChange, NodeDraft};
pub use types::{Edge, Node, NodeKind, Position, SemanticType, Viewport, SEMANTIC_CATALOGUE};
