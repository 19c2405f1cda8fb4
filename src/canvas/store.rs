//! The graph store: sole owner of the canonical node/edge collections.
//!
//! Every consumer reads through the query surface and writes through the
//! mutation surface; nothing else holds a mutable handle to the arrays.
//! Mutations are synchronous and atomic from the caller's perspective, and
//! invariant violations (self-loops, dangling endpoints, duplicate IDs) are
//! rejected silently with a log entry so the editor stays usable no matter
//! what a caller passes in.

use log::{debug, warn};

use super::connection::PendingConnection;
use super::ident::fresh_id;
use super::selection::{FetchPlan, Selection};
use super::suggestions::{ContextCache, SuggestionState};
use super::synthesis::SynthesisStatus;
use super::types::{Edge, Node, NodeKind, Position, Provenance, SemanticType, Viewport};

/// Raw connection parameters as delivered by a completed drag gesture.
#[derive(Clone, Debug)]
pub struct Connection {
	pub source: String,
	pub target: String,
	pub source_handle: Option<String>,
	pub target_handle: Option<String>,
}

impl Connection {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Connection {
		Connection {
			source: source.into(),
			target: target.into(),
			source_handle: None,
			target_handle: None,
		}
	}
}

/// Optional fields for a node being created or patched.
#[derive(Clone, Debug, Default)]
pub struct NodeDraft {
	pub label: Option<String>,
	pub description: Option<String>,
	pub origin_id: Option<String>,
	pub domain: Option<String>,
	pub color: Option<String>,
	pub scale: Option<f64>,
	pub created_at: Option<f64>,
	pub source: Option<Provenance>,
}

/// Optional fields for an edge committed through [`CanvasStore::add_edge`].
#[derive(Clone, Debug, Default)]
pub struct EdgeDraft {
	/// Explicit ID for server-supplied edges; generated when absent.
	pub id: Option<String>,
	pub semantic_type: Option<SemanticType>,
	pub lineage: bool,
	pub internal_type: Option<String>,
}

/// A view-originated node delta, applied in batches.
#[derive(Clone, Debug)]
pub enum NodeChange {
	Position { id: String, position: Position },
	Select { id: String, selected: bool },
	Remove { id: String },
}

/// A view-originated edge delta.
#[derive(Clone, Debug)]
pub enum EdgeChange {
	Select { id: String, selected: bool },
	Remove { id: String },
}

/// Canonical graph state plus the coordinator sub-states that share its
/// single-threaded discipline. Constructed per canvas instance and injected
/// into consumers; never a process-wide singleton.
#[derive(Clone, Debug)]
pub struct CanvasStore {
	pub(crate) nodes: Vec<Node>,
	pub(crate) edges: Vec<Edge>,
	pub(crate) selection: Selection,
	pub(crate) pending: Option<PendingConnection>,
	pub(crate) suggestions: SuggestionState,
	pub(crate) context: ContextCache,
	pub(crate) synthesis: SynthesisStatus,
	pub(crate) viewport: Viewport,
	revision: u64,
	jitter: u64,
}

impl Default for CanvasStore {
	fn default() -> Self {
		CanvasStore::new()
	}
}

impl CanvasStore {
	pub fn new() -> CanvasStore {
		CanvasStore {
			nodes: Vec::new(),
			edges: Vec::new(),
			selection: Selection::None,
			pending: None,
			suggestions: SuggestionState::default(),
			context: ContextCache::default(),
			synthesis: SynthesisStatus::default(),
			viewport: Viewport::default(),
			revision: 0,
			jitter: 1,
		}
	}

	// --- query surface -----------------------------------------------------

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn edge(&self, id: &str) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Monotonic counter bumped on every committed mutation to persisted
	/// state (nodes, edges, viewport). Drives the debounced snapshot writer.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub(crate) fn touch(&mut self) {
		self.revision += 1;
	}

	pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	pub(crate) fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
		self.edges.iter_mut().find(|e| e.id == id)
	}

	/// Deterministic unit-interval sequence for placement jitter.
	pub(crate) fn next_unit(&mut self) -> f64 {
		self.jitter = (self.jitter.wrapping_mul(9301).wrapping_add(49297)) % 233280;
		self.jitter as f64 / 233280.0
	}

	// --- node mutations ----------------------------------------------------

	/// Construct a node with a generated ID and kind-specific defaults,
	/// append it and return it.
	pub fn add_node(&mut self, kind: NodeKind, position: Position, draft: NodeDraft) -> Node {
		let node = Node {
			id: fresh_id(),
			kind,
			label: draft.label.unwrap_or_else(|| kind.default_label()),
			position: position.sanitized(),
			color: draft.color,
			scale: draft.scale,
			origin_id: draft.origin_id,
			description: draft.description.unwrap_or_default(),
			domain: draft.domain,
			created_at: draft.created_at,
			source: draft.source.unwrap_or(Provenance::UserCreated),
			synthesis_output: None,
			lineage_report: None,
			selected: false,
		};
		self.nodes.push(node.clone());
		self.touch();
		node
	}

	/// Append a batch of prebuilt nodes, dropping invalid entries per item:
	/// missing IDs, non-finite positions and IDs already present are logged
	/// and skipped without failing the rest of the batch.
	pub fn add_nodes_bulk(&mut self, nodes: Vec<Node>) -> usize {
		let mut added = 0;
		for node in nodes {
			if node.id.is_empty() {
				warn!("dropping bulk node without an id (label {:?})", node.label);
				continue;
			}
			if !node.position.is_finite() {
				warn!("dropping bulk node {} with non-finite position", node.id);
				continue;
			}
			if self.node(&node.id).is_some() {
				debug!("skipping bulk node {}: id already on canvas", node.id);
				continue;
			}
			self.nodes.push(node);
			added += 1;
		}
		if added > 0 {
			self.touch();
		}
		added
	}

	/// Shallow-merge draft fields into an existing node. No-op when the ID
	/// is absent.
	pub fn update_node_data(&mut self, id: &str, patch: NodeDraft) {
		let Some(node) = self.node_mut(id) else {
			warn!("update_node_data: no node {id}");
			return;
		};
		if let Some(label) = patch.label {
			node.label = label;
		}
		if let Some(description) = patch.description {
			node.description = description;
		}
		if let Some(origin_id) = patch.origin_id {
			node.origin_id = Some(origin_id);
		}
		if let Some(domain) = patch.domain {
			node.domain = Some(domain);
		}
		if let Some(color) = patch.color {
			node.color = Some(color);
		}
		if let Some(scale) = patch.scale {
			node.scale = Some(scale);
		}
		if let Some(created_at) = patch.created_at {
			node.created_at = Some(created_at);
		}
		if let Some(source) = patch.source {
			node.source = source;
		}
		self.touch();
	}

	/// Remove a node and, cascading, every edge touching it. Clears the
	/// focus selection and the pending connection when they referenced the
	/// removed entities.
	pub fn delete_node(&mut self, id: &str) {
		let before = self.nodes.len();
		self.nodes.retain(|n| n.id != id);
		if self.nodes.len() == before {
			debug!("delete_node: no node {id}");
			return;
		}
		let removed_edges: Vec<String> = self
			.edges
			.iter()
			.filter(|e| e.touches(id))
			.map(|e| e.id.clone())
			.collect();
		self.edges.retain(|e| !e.touches(id));

		let focus_lost = match &self.selection {
			Selection::Node(selected) => selected == id,
			Selection::Edge(selected) => removed_edges.iter().any(|e| e == selected),
			Selection::None => false,
		};
		if focus_lost {
			self.clear_selection();
		}
		if self.pending.as_ref().is_some_and(|p| p.source == id || p.target == id) {
			self.pending = None;
			self.suggestions.edge.clear();
		}
		self.touch();
	}

	// --- edge mutations ----------------------------------------------------

	/// The single commit point for edges. Validates that the connection is
	/// not a self-loop and that both endpoints exist; on violation nothing
	/// is mutated and `None` is returned.
	pub fn add_edge(&mut self, connection: &Connection, draft: EdgeDraft) -> Option<Edge> {
		if connection.source == connection.target {
			warn!("rejecting self-loop edge on {}", connection.source);
			return None;
		}
		if self.node(&connection.source).is_none() {
			warn!("rejecting edge: source {} not on canvas", connection.source);
			return None;
		}
		if self.node(&connection.target).is_none() {
			warn!("rejecting edge: target {} not on canvas", connection.target);
			return None;
		}
		if let Some(id) = &draft.id {
			if self.edge(id).is_some() {
				debug!("rejecting edge {id}: id already on canvas");
				return None;
			}
		}
		let edge = Edge {
			id: draft.id.unwrap_or_else(fresh_id),
			source: connection.source.clone(),
			target: connection.target.clone(),
			semantic_type: draft.semantic_type,
			lineage: draft.lineage,
			internal_type: draft.internal_type,
			selected: false,
		};
		self.edges.push(edge.clone());
		self.touch();
		Some(edge)
	}

	/// Append a batch of prebuilt edges, dropping duplicates, self-loops and
	/// dangling endpoints per item.
	pub fn add_edges_bulk(&mut self, edges: Vec<Edge>) -> usize {
		let mut added = 0;
		for edge in edges {
			if edge.id.is_empty() {
				warn!("dropping bulk edge without an id ({} -> {})", edge.source, edge.target);
				continue;
			}
			if self.edge(&edge.id).is_some() {
				debug!("skipping bulk edge {}: id already on canvas", edge.id);
				continue;
			}
			if edge.source == edge.target {
				warn!("dropping self-loop bulk edge {}", edge.id);
				continue;
			}
			if self.node(&edge.source).is_none() || self.node(&edge.target).is_none() {
				warn!("dropping bulk edge {} with missing endpoint", edge.id);
				continue;
			}
			self.edges.push(edge);
			added += 1;
		}
		if added > 0 {
			self.touch();
		}
		added
	}

	pub fn delete_edge(&mut self, id: &str) {
		let before = self.edges.len();
		self.edges.retain(|e| e.id != id);
		if self.edges.len() == before {
			debug!("delete_edge: no edge {id}");
			return;
		}
		if matches!(&self.selection, Selection::Edge(selected) if selected == id) {
			self.clear_selection();
		}
		self.touch();
	}

	// --- view change batches -----------------------------------------------

	/// Reconcile a batch of view-originated node deltas in one pass.
	/// Selection-type changes are forwarded to the selection coordinator
	/// before position/remove changes are applied; the returned fetch plans
	/// belong to the focus transition, if any.
	pub fn apply_node_changes(&mut self, changes: Vec<NodeChange>) -> Vec<FetchPlan> {
		let mut plans = Vec::new();
		let mut rest = Vec::with_capacity(changes.len());
		for change in changes {
			match change {
				NodeChange::Select { id, selected } => {
					let Some(node) = self.node_mut(&id) else {
						debug!("select change for unknown node {id}");
						continue;
					};
					node.selected = selected;
					if selected {
						plans = self.select_node(&id);
					} else if matches!(&self.selection, Selection::Node(f) if *f == id) {
						self.clear_selection();
					}
				}
				other => rest.push(other),
			}
		}
		let mut moved = false;
		for change in rest {
			match change {
				NodeChange::Position { id, position } => {
					if let Some(node) = self.node_mut(&id) {
						node.position = position.sanitized();
						moved = true;
					}
				}
				NodeChange::Remove { id } => self.delete_node(&id),
				NodeChange::Select { .. } => unreachable!("extracted above"),
			}
		}
		if moved {
			self.touch();
		}
		plans
	}

	/// Edge counterpart of [`CanvasStore::apply_node_changes`].
	pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) -> Vec<FetchPlan> {
		let mut plans = Vec::new();
		let mut rest = Vec::with_capacity(changes.len());
		for change in changes {
			match change {
				EdgeChange::Select { id, selected } => {
					let Some(edge) = self.edge_mut(&id) else {
						debug!("select change for unknown edge {id}");
						continue;
					};
					edge.selected = selected;
					if selected {
						plans = self.select_edge(&id);
					} else if matches!(&self.selection, Selection::Edge(f) if *f == id) {
						self.clear_selection();
					}
				}
				other => rest.push(other),
			}
		}
		for change in rest {
			match change {
				EdgeChange::Remove { id } => self.delete_edge(&id),
				EdgeChange::Select { .. } => unreachable!("extracted above"),
			}
		}
		plans
	}

	// --- viewport & reset --------------------------------------------------

	pub fn set_viewport(&mut self, viewport: Viewport) {
		if !viewport.is_valid() {
			warn!("ignoring invalid viewport {viewport:?}");
			return;
		}
		self.viewport = viewport;
		self.touch();
	}

	/// Full canvas reset: graph, selection, pending connection, caches and
	/// viewport all return to their initial state.
	pub fn reset(&mut self) {
		self.nodes.clear();
		self.edges.clear();
		self.selection = Selection::None;
		self.pending = None;
		self.suggestions.node.clear();
		self.suggestions.edge.clear();
		self.context.clear();
		self.synthesis = SynthesisStatus::default();
		self.viewport = Viewport::default();
		self.touch();
	}
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;

	/// Build a store with `n` plain concept nodes named n0..n{n-1}.
	pub fn store_with_nodes(n: usize) -> (CanvasStore, Vec<String>) {
		let mut store = CanvasStore::new();
		let mut ids = Vec::new();
		for i in 0..n {
			let node = store.add_node(
				NodeKind::Concept,
				Position::new(i as f64 * 100.0, 0.0),
				NodeDraft {
					label: Some(format!("n{i}")),
					..NodeDraft::default()
				},
			);
			ids.push(node.id);
		}
		(store, ids)
	}

	/// Assert the no-dangling-edges invariant.
	pub fn assert_no_dangling(store: &CanvasStore) {
		for edge in store.edges() {
			assert!(store.node(&edge.source).is_some(), "dangling source in {}", edge.id);
			assert!(store.node(&edge.target).is_some(), "dangling target in {}", edge.id);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::test_support::*;
	use super::*;

	#[test]
	fn add_node_applies_kind_defaults() {
		let mut store = CanvasStore::new();
		let node = store.add_node(NodeKind::Axiom, Position::new(10.0, 20.0), NodeDraft::default());
		assert_eq!(node.label, "New Axiom");
		assert_eq!(node.description, "");
		assert_eq!(node.source, Provenance::UserCreated);
		assert!(store.node(&node.id).is_some());
		assert_eq!(store.nodes().len(), 1);
	}

	#[test]
	fn add_node_sanitizes_position() {
		let mut store = CanvasStore::new();
		let node = store.add_node(NodeKind::Concept, Position::new(f64::NAN, 5.0), NodeDraft::default());
		assert!(node.position.is_finite());
	}

	#[test]
	fn bulk_add_drops_duplicates_and_invalid() {
		let (mut store, ids) = store_with_nodes(1);
		let dup = store.node(&ids[0]).unwrap().clone();
		let mut no_id = dup.clone();
		no_id.id = String::new();
		let mut nan_pos = dup.clone();
		nan_pos.id = "fresh".into();
		nan_pos.position = Position::new(f64::NAN, 0.0);
		let mut ok = dup.clone();
		ok.id = "ok".into();

		let added = store.add_nodes_bulk(vec![dup, no_id, nan_pos, ok]);
		assert_eq!(added, 1);
		assert_eq!(store.nodes().len(), 2);
	}

	#[test]
	fn self_loop_never_mutates_edges() {
		let (mut store, ids) = store_with_nodes(1);
		let out = store.add_edge(&Connection::new(ids[0].clone(), ids[0].clone()), EdgeDraft::default());
		assert!(out.is_none());
		assert!(store.edges().is_empty());
	}

	#[test]
	fn dangling_endpoint_rejected_at_insertion() {
		let (mut store, ids) = store_with_nodes(1);
		let out = store.add_edge(&Connection::new(ids[0].clone(), "ghost"), EdgeDraft::default());
		assert!(out.is_none());
		assert!(store.edges().is_empty());
		assert_no_dangling(&store);
	}

	#[test]
	fn cascade_delete_removes_touching_edges() {
		let (mut store, ids) = store_with_nodes(3);
		store.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default());
		store.add_edge(&Connection::new(ids[1].clone(), ids[2].clone()), EdgeDraft::default());
		store.add_edge(&Connection::new(ids[0].clone(), ids[2].clone()), EdgeDraft::default());

		store.delete_node(&ids[1]);
		assert_eq!(store.nodes().len(), 2);
		assert_eq!(store.edges().len(), 1);
		assert_no_dangling(&store);
	}

	#[test]
	fn delete_selected_node_clears_focus() {
		let (mut store, ids) = store_with_nodes(2);
		store.select_node(&ids[0]);
		store.delete_node(&ids[0]);
		assert_eq!(*store.selection(), Selection::None);
	}

	#[test]
	fn delete_node_clears_focus_on_removed_edge() {
		let (mut store, ids) = store_with_nodes(2);
		let edge = store
			.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default())
			.unwrap();
		store.select_edge(&edge.id);
		store.delete_node(&ids[0]);
		assert_eq!(*store.selection(), Selection::None);
	}

	#[test]
	fn update_node_data_merges_shallowly() {
		let (mut store, ids) = store_with_nodes(1);
		store.update_node_data(
			&ids[0],
			NodeDraft {
				description: Some("a theory".into()),
				..NodeDraft::default()
			},
		);
		let node = store.node(&ids[0]).unwrap();
		assert_eq!(node.description, "a theory");
		assert_eq!(node.label, "n0");
		// absent id is a no-op
		store.update_node_data("ghost", NodeDraft::default());
	}

	#[test]
	fn position_changes_apply_in_order() {
		let (mut store, ids) = store_with_nodes(1);
		store.apply_node_changes(vec![
			NodeChange::Position {
				id: ids[0].clone(),
				position: Position::new(5.0, 5.0),
			},
			NodeChange::Position {
				id: ids[0].clone(),
				position: Position::new(9.0, 9.0),
			},
		]);
		assert_eq!(store.node(&ids[0]).unwrap().position, Position::new(9.0, 9.0));
	}

	#[test]
	fn remove_change_cascades_like_delete() {
		let (mut store, ids) = store_with_nodes(2);
		store.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default());
		store.apply_node_changes(vec![NodeChange::Remove { id: ids[0].clone() }]);
		assert_eq!(store.nodes().len(), 1);
		assert!(store.edges().is_empty());
	}

	#[test]
	fn duplicate_edge_id_rejected() {
		let (mut store, ids) = store_with_nodes(3);
		let conn = Connection::new(ids[0].clone(), ids[1].clone());
		store.add_edge(
			&conn,
			EdgeDraft {
				id: Some("e1".into()),
				..EdgeDraft::default()
			},
		);
		let second = store.add_edge(
			&Connection::new(ids[1].clone(), ids[2].clone()),
			EdgeDraft {
				id: Some("e1".into()),
				..EdgeDraft::default()
			},
		);
		assert!(second.is_none());
		assert_eq!(store.edges().len(), 1);
	}

	#[test]
	fn reset_returns_to_initial_state() {
		let (mut store, ids) = store_with_nodes(2);
		store.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default());
		store.select_node(&ids[0]);
		store.reset();
		assert!(store.nodes().is_empty());
		assert!(store.edges().is_empty());
		assert_eq!(*store.selection(), Selection::None);
		assert_eq!(store.viewport(), Viewport::default());
	}

	#[test]
	fn revision_tracks_persisted_mutations_only() {
		let (mut store, ids) = store_with_nodes(1);
		let rev = store.revision();
		store.select_node(&ids[0]);
		assert_eq!(store.revision(), rev, "focus changes are not persisted");
		store.set_viewport(Viewport {
			x: 1.0,
			y: 2.0,
			zoom: 2.0,
		});
		assert!(store.revision() > rev);
	}
}
