//! The connection protocol: a two-phase commit turning a raw drag gesture
//! into a semantically typed edge.
//!
//! Phase one stores the pending endpoints and kicks off an edge-type
//! suggestion fetch; phase two commits through the store's single edge
//! commit point, or cancels. Exactly one connection may be pending at a
//! time; starting a new one discards the old one outright.

use log::{error, warn};

use super::selection::FetchPlan;
use super::store::{CanvasStore, Connection, EdgeDraft};
use super::types::{Edge, SemanticType};

/// An uncommitted drag-drawn connection awaiting relationship confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConnection {
	pub source: String,
	pub target: String,
	pub source_handle: Option<String>,
	pub target_handle: Option<String>,
}

impl PendingConnection {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> PendingConnection {
		PendingConnection {
			source: source.into(),
			target: target.into(),
			source_handle: None,
			target_handle: None,
		}
	}
}

impl CanvasStore {
	pub fn pending_connection(&self) -> Option<&PendingConnection> {
		self.pending.as_ref()
	}

	/// Store (or clear, with `None`) the pending connection. Any previously
	/// pending connection is discarded, never queued. Returns the edge-type
	/// suggestion fetch to start for the new endpoint pair.
	pub fn set_pending_connection(&mut self, pending: Option<PendingConnection>) -> Vec<FetchPlan> {
		// whatever happens next, the old pending connection is gone
		self.pending = None;
		self.suggestions.edge.clear();
		let Some(pending) = pending else {
			return Vec::new();
		};
		if pending.source == pending.target {
			warn!("ignoring self-loop connection gesture on {}", pending.source);
			return Vec::new();
		}
		let (Some(source), Some(target)) = (self.node(&pending.source), self.node(&pending.target))
		else {
			warn!(
				"ignoring connection gesture with missing endpoint ({} -> {})",
				pending.source, pending.target
			);
			return Vec::new();
		};
		let (source, target) = (source.clone(), target.clone());
		self.pending = Some(pending);
		vec![FetchPlan::EdgeTypeSuggestions {
			ticket: self.suggestions.edge.begin(),
			source,
			target,
		}]
	}

	/// Commit the pending connection as an edge of the chosen semantic type.
	/// With nothing pending this logs and returns `None`; it must never
	/// crash out of a double-confirm race.
	pub fn confirm_relationship_selection(&mut self, semantic_type: SemanticType) -> Option<Edge> {
		let Some(pending) = self.pending.take() else {
			error!("confirm_relationship_selection called with no pending connection");
			return None;
		};
		let connection = Connection {
			source: pending.source,
			target: pending.target,
			source_handle: pending.source_handle,
			target_handle: pending.target_handle,
		};
		let edge = self.add_edge(
			&connection,
			EdgeDraft {
				semantic_type: Some(semantic_type),
				..EdgeDraft::default()
			},
		);
		self.suggestions.edge.clear();
		edge
	}

	/// Cancel the chooser without creating an edge.
	pub fn close_relationship_selector(&mut self) {
		self.pending = None;
		self.suggestions.edge.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::super::store::test_support::store_with_nodes;
	use super::*;

	#[test]
	fn basic_connection_scenario() {
		let (mut store, ids) = store_with_nodes(2);
		store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), ids[1].clone())));
		let edge = store
			.confirm_relationship_selection(SemanticType::RelatedTo)
			.expect("edge committed");
		assert_eq!(store.edges().len(), 1);
		assert_eq!(edge.source, ids[0]);
		assert_eq!(edge.target, ids[1]);
		assert_eq!(edge.semantic_type, Some(SemanticType::RelatedTo));
		assert_eq!(edge.label(), Some("related to"));
		assert!(store.pending_connection().is_none());
	}

	#[test]
	fn new_pending_replaces_old() {
		let (mut store, ids) = store_with_nodes(3);
		store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), ids[1].clone())));
		store.set_pending_connection(Some(PendingConnection::new(ids[1].clone(), ids[2].clone())));
		let pending = store.pending_connection().unwrap();
		assert_eq!(pending.source, ids[1]);
		assert_eq!(pending.target, ids[2]);
		// confirming commits only the replacement
		store.confirm_relationship_selection(SemanticType::Opposes);
		assert_eq!(store.edges().len(), 1);
		assert_eq!(store.edges()[0].source, ids[1]);
	}

	#[test]
	fn confirm_without_pending_is_a_noop() {
		let (mut store, _) = store_with_nodes(2);
		assert!(store.confirm_relationship_selection(SemanticType::RelatedTo).is_none());
		assert!(store.edges().is_empty());
	}

	#[test]
	fn cancel_discards_without_creating_edge() {
		let (mut store, ids) = store_with_nodes(2);
		store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), ids[1].clone())));
		store.close_relationship_selector();
		assert!(store.pending_connection().is_none());
		assert!(store.edges().is_empty());
		// a confirm after cancel is the no-pending path
		assert!(store.confirm_relationship_selection(SemanticType::RelatedTo).is_none());
	}

	#[test]
	fn gesture_with_missing_endpoint_is_ignored() {
		let (mut store, ids) = store_with_nodes(1);
		let plans = store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), "ghost")));
		assert!(plans.is_empty());
		assert!(store.pending_connection().is_none());
	}

	#[test]
	fn self_loop_gesture_is_ignored() {
		let (mut store, ids) = store_with_nodes(1);
		store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), ids[0].clone())));
		assert!(store.pending_connection().is_none());
		assert!(store.confirm_relationship_selection(SemanticType::RelatedTo).is_none());
	}

	#[test]
	fn pending_triggers_edge_type_fetch() {
		let (mut store, ids) = store_with_nodes(2);
		let plans = store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), ids[1].clone())));
		assert_eq!(plans.len(), 1);
		assert!(matches!(plans[0], FetchPlan::EdgeTypeSuggestions { .. }));
		assert!(store.edge_type_suggestions().is_fetching());
		// cancelling clears the suggestion slot
		store.close_relationship_selector();
		assert!(!store.edge_type_suggestions().is_fetching());
	}

	#[test]
	fn deleting_endpoint_discards_pending() {
		let (mut store, ids) = store_with_nodes(2);
		store.set_pending_connection(Some(PendingConnection::new(ids[0].clone(), ids[1].clone())));
		store.delete_node(&ids[1]);
		assert!(store.pending_connection().is_none());
	}
}
