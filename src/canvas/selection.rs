//! Selection & inspector coordination.
//!
//! Focus is a sum type, so "a node and an edge selected at once" is
//! unrepresentable. Selection transitions are synchronous; the async work
//! they imply (context and suggestion fetches) is returned to the caller as
//! [`FetchPlan`] values carrying staleness tickets, and the view layer
//! executes them with `spawn_local`. Inspector visibility is a pure function
//! of the focus state.

use log::warn;

use super::store::CanvasStore;
use super::suggestions::{ContextEntry, FetchSlot, FetchTicket, NodeContext, SuggestedConcept};
use super::types::{Node, SemanticType};

/// Inspector focus: at most one node or one edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	None,
	Node(String),
	Edge(String),
}

/// An async fetch the view layer must start on behalf of the store.
#[derive(Clone, Debug)]
pub enum FetchPlan {
	NodeContext {
		origin_id: String,
	},
	NodeSuggestions {
		ticket: FetchTicket,
		origin_id: String,
		/// Origin IDs already on canvas, excluded server-side.
		exclude: Vec<String>,
	},
	EdgeTypeSuggestions {
		ticket: FetchTicket,
		source: Node,
		target: Node,
	},
}

impl CanvasStore {
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Inspector visibility is derived, never stored.
	pub fn inspector_open(&self) -> bool {
		self.selection != Selection::None
	}

	pub fn node_suggestions(&self) -> &FetchSlot<SuggestedConcept> {
		&self.suggestions.node
	}

	pub fn edge_type_suggestions(&self) -> &FetchSlot<SemanticType> {
		&self.suggestions.edge
	}

	pub fn context_for(&self, origin_id: &str) -> Option<&ContextEntry> {
		self.context.get(origin_id)
	}

	/// Context entry for the focused node, if it has an origin id.
	pub fn focused_context(&self) -> Option<&ContextEntry> {
		let Selection::Node(id) = &self.selection else {
			return None;
		};
		let origin = self.node(id)?.origin_id.as_deref()?;
		self.context.get(origin)
	}

	/// Focus a node: clears any edge focus, drops cache entries that do not
	/// belong to the new focus and plans the context + suggestion fetches.
	/// Nodes without an origin id simply plan nothing.
	pub fn select_node(&mut self, id: &str) -> Vec<FetchPlan> {
		let Some(node) = self.node(id) else {
			warn!("select_node: no node {id}");
			return Vec::new();
		};
		let origin_id = node.origin_id.clone();
		self.selection = Selection::Node(id.to_string());
		self.suggestions.node.clear();
		// edge-type suggestions belong to an open chooser, if any
		if self.pending.is_none() {
			self.suggestions.edge.clear();
		}
		self.context.retain_only(origin_id.as_deref());

		let Some(origin_id) = origin_id else {
			return Vec::new();
		};
		let exclude: Vec<String> = self
			.nodes
			.iter()
			.filter_map(|n| n.origin_id.clone())
			.collect();
		let mut plans = Vec::new();
		if self.context.begin(&origin_id) {
			plans.push(FetchPlan::NodeContext {
				origin_id: origin_id.clone(),
			});
		}
		plans.push(FetchPlan::NodeSuggestions {
			ticket: self.suggestions.node.begin(),
			origin_id,
			exclude,
		});
		plans
	}

	/// Focus an edge: clears any node focus and plans an edge-type
	/// suggestion fetch for the edge's endpoint pair.
	pub fn select_edge(&mut self, id: &str) -> Vec<FetchPlan> {
		let Some(edge) = self.edge(id) else {
			warn!("select_edge: no edge {id}");
			return Vec::new();
		};
		let (source_id, target_id) = (edge.source.clone(), edge.target.clone());
		// both endpoints are guaranteed present by the insertion invariant
		let (Some(source), Some(target)) = (self.node(&source_id), self.node(&target_id)) else {
			warn!("select_edge: edge {id} has a missing endpoint");
			return Vec::new();
		};
		let (source, target) = (source.clone(), target.clone());
		self.selection = Selection::Edge(id.to_string());
		self.suggestions.node.clear();
		vec![FetchPlan::EdgeTypeSuggestions {
			ticket: self.suggestions.edge.begin(),
			source,
			target,
		}]
	}

	/// Drop focus, close the inspector and clear every advisory cache so the
	/// next selection never sees stale data.
	pub fn clear_selection(&mut self) {
		self.selection = Selection::None;
		self.suggestions.node.clear();
		self.suggestions.edge.clear();
		self.context.clear();
	}

	// --- fetch resolution (called from the async glue) ---------------------

	/// Commit a node-suggestion result; stale tickets are discarded.
	pub fn resolve_node_suggestions(
		&mut self,
		ticket: FetchTicket,
		result: Result<Vec<SuggestedConcept>, String>,
	) -> bool {
		self.suggestions.node.resolve(ticket, result)
	}

	/// Commit an edge-type suggestion result; stale tickets are discarded.
	pub fn resolve_edge_type_suggestions(
		&mut self,
		ticket: FetchTicket,
		result: Result<Vec<SemanticType>, String>,
	) -> bool {
		self.suggestions.edge.resolve(ticket, result)
	}

	/// Commit a context result for an origin id still marked loading.
	pub fn resolve_context(&mut self, origin_id: &str, result: Result<NodeContext, String>) -> bool {
		self.context.resolve(origin_id, result)
	}
}

#[cfg(test)]
mod tests {
	use super::super::store::test_support::store_with_nodes;
	use super::super::store::{Connection, EdgeDraft, NodeDraft};
	use super::super::types::{NodeKind, Position};
	use super::*;

	#[test]
	fn selection_is_mutually_exclusive() {
		let (mut store, ids) = store_with_nodes(2);
		let edge = store
			.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default())
			.unwrap();

		store.select_node(&ids[0]);
		assert_eq!(*store.selection(), Selection::Node(ids[0].clone()));
		store.select_edge(&edge.id);
		assert_eq!(*store.selection(), Selection::Edge(edge.id.clone()));
		store.select_node(&ids[1]);
		assert_eq!(*store.selection(), Selection::Node(ids[1].clone()));
		store.clear_selection();
		assert_eq!(*store.selection(), Selection::None);
	}

	#[test]
	fn inspector_follows_selection() {
		let (mut store, ids) = store_with_nodes(1);
		assert!(!store.inspector_open());
		store.select_node(&ids[0]);
		assert!(store.inspector_open());
		store.clear_selection();
		assert!(!store.inspector_open());
	}

	#[test]
	fn node_without_origin_plans_nothing() {
		let (mut store, ids) = store_with_nodes(1);
		let plans = store.select_node(&ids[0]);
		assert!(plans.is_empty());
	}

	#[test]
	fn node_with_origin_plans_context_and_suggestions() {
		let mut store = super::super::store::CanvasStore::new();
		let node = store.add_node(
			NodeKind::Thinker,
			Position::default(),
			NodeDraft {
				origin_id: Some("ki:thinker:plato".into()),
				..NodeDraft::default()
			},
		);
		let plans = store.select_node(&node.id);
		assert_eq!(plans.len(), 2);
		assert!(matches!(&plans[0], FetchPlan::NodeContext { origin_id } if origin_id == "ki:thinker:plato"));
		match &plans[1] {
			FetchPlan::NodeSuggestions { exclude, .. } => {
				assert_eq!(exclude, &vec!["ki:thinker:plato".to_string()]);
			}
			other => panic!("expected NodeSuggestions, got {other:?}"),
		}
		assert!(store.node_suggestions().is_fetching());
	}

	#[test]
	fn reselecting_cached_context_does_not_refetch() {
		let mut store = super::super::store::CanvasStore::new();
		let node = store.add_node(
			NodeKind::Concept,
			Position::default(),
			NodeDraft {
				origin_id: Some("ki:concept:a".into()),
				..NodeDraft::default()
			},
		);
		let plans = store.select_node(&node.id);
		assert!(matches!(plans[0], FetchPlan::NodeContext { .. }));
		store.resolve_context("ki:concept:a", Ok(NodeContext::default()));
		// selecting the same node again keeps the cached entry
		let plans = store.select_node(&node.id);
		assert!(!plans.iter().any(|p| matches!(p, FetchPlan::NodeContext { .. })));
		assert!(matches!(store.focused_context(), Some(ContextEntry::Ready(_))));
	}

	#[test]
	fn selecting_edge_plans_endpoint_pair_fetch() {
		let (mut store, ids) = store_with_nodes(2);
		let edge = store
			.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default())
			.unwrap();
		let plans = store.select_edge(&edge.id);
		assert_eq!(plans.len(), 1);
		match &plans[0] {
			FetchPlan::EdgeTypeSuggestions { source, target, .. } => {
				assert_eq!(source.id, ids[0]);
				assert_eq!(target.id, ids[1]);
			}
			other => panic!("expected EdgeTypeSuggestions, got {other:?}"),
		}
	}

	#[test]
	fn stale_suggestions_never_reach_new_selection() {
		let mut store = super::super::store::CanvasStore::new();
		let a = store.add_node(
			NodeKind::Concept,
			Position::default(),
			NodeDraft {
				origin_id: Some("ki:a".into()),
				..NodeDraft::default()
			},
		);
		let b = store.add_node(
			NodeKind::Concept,
			Position::default(),
			NodeDraft {
				origin_id: Some("ki:b".into()),
				..NodeDraft::default()
			},
		);
		let plans_a = store.select_node(&a.id);
		let ticket_a = match &plans_a[1] {
			FetchPlan::NodeSuggestions { ticket, .. } => *ticket,
			_ => unreachable!(),
		};
		// user moves on to node B before A's fetch lands
		store.select_node(&b.id);
		let late = vec![SuggestedConcept {
			label: "stale".into(),
			kind: NodeKind::Concept,
			origin_id: None,
			description: String::new(),
		}];
		assert!(!store.resolve_node_suggestions(ticket_a, Ok(late)));
		assert!(store.node_suggestions().items().is_empty());
		// B's own fetch is still considered live
		assert!(store.node_suggestions().is_fetching());
	}

	#[test]
	fn clear_selection_drops_all_caches() {
		let mut store = super::super::store::CanvasStore::new();
		let node = store.add_node(
			NodeKind::Concept,
			Position::default(),
			NodeDraft {
				origin_id: Some("ki:a".into()),
				..NodeDraft::default()
			},
		);
		store.select_node(&node.id);
		store.resolve_context("ki:a", Ok(NodeContext::default()));
		store.clear_selection();
		assert!(store.context_for("ki:a").is_none());
		assert!(store.node_suggestions().items().is_empty());
	}
}
