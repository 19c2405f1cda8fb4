//! Suggestion and context fetch lifecycle.
//!
//! Async results are only advisory UI data, so failures never propagate:
//! they clear the list, flip the fetching flag off and record an error
//! string. Staleness is handled with generation counters rather than true
//! cancellation: every `begin` bumps the slot's generation and hands out a
//! ticket; a `resolve` with an outdated ticket is discarded wholesale, so a
//! slow response can never overwrite state belonging to a newer selection.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::types::{NodeKind, SemanticType};

/// Proof of which fetch a resolution belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
	pub(crate) generation: u64,
}

/// One async slot: at most one fetch is live at a time, and only the most
/// recently begun fetch may commit its result.
#[derive(Clone, Debug)]
pub struct FetchSlot<T> {
	generation: u64,
	fetching: bool,
	error: Option<String>,
	items: Vec<T>,
}

impl<T> Default for FetchSlot<T> {
	fn default() -> Self {
		FetchSlot {
			generation: 0,
			fetching: false,
			error: None,
			items: Vec::new(),
		}
	}
}

impl<T> FetchSlot<T> {
	/// Mark a fetch as in flight and return the ticket its resolution must
	/// present. Any previously issued ticket becomes stale.
	pub(crate) fn begin(&mut self) -> FetchTicket {
		self.generation += 1;
		self.fetching = true;
		self.error = None;
		self.items.clear();
		FetchTicket {
			generation: self.generation,
		}
	}

	/// Commit a fetch result. Returns false (and changes nothing) when the
	/// ticket is stale.
	pub(crate) fn resolve(&mut self, ticket: FetchTicket, result: Result<Vec<T>, String>) -> bool {
		if ticket.generation != self.generation {
			debug!("discarding stale fetch result (ticket {} != current {})", ticket.generation, self.generation);
			return false;
		}
		self.fetching = false;
		match result {
			Ok(items) => {
				self.items = items;
			}
			Err(message) => {
				warn!("suggestion fetch failed: {message}");
				self.items.clear();
				self.error = Some(message);
			}
		}
		true
	}

	/// Empty the slot and invalidate any in-flight ticket.
	pub(crate) fn clear(&mut self) {
		self.generation += 1;
		self.fetching = false;
		self.error = None;
		self.items.clear();
	}

	pub fn is_fetching(&self) -> bool {
		self.fetching
	}

	pub fn items(&self) -> &[T] {
		&self.items
	}

	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}
}

/// A candidate concept returned by the node-suggestion endpoint. Not a
/// canvas node yet; placing it goes through the store's `add_node`.
#[derive(Clone, Debug, PartialEq)]
pub struct SuggestedConcept {
	pub label: String,
	pub kind: NodeKind,
	pub origin_id: Option<String>,
	pub description: String,
}

/// The two independent suggestion request kinds sharing one lifecycle.
#[derive(Clone, Debug, Default)]
pub struct SuggestionState {
	pub(crate) node: FetchSlot<SuggestedConcept>,
	pub(crate) edge: FetchSlot<SemanticType>,
}

/// A node related to the inspected one, as reported by the context endpoint.
/// The kind stays a raw tag here; the backend ontology is wider than the
/// canvas kind set and this is display-only data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedNode {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub label: String,
	#[serde(rename = "type", default)]
	pub kind: Option<String>,
	#[serde(default)]
	pub relationship: Option<String>,
}

/// An edge relevant to the inspected node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevantEdge {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub source: String,
	#[serde(default)]
	pub target: String,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub semantic_label: Option<String>,
}

/// Knowledge-base context for a node, shown in the inspector.
/// Field names mirror the backend response (camelCase collections).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeContext {
	#[serde(default)]
	pub summary: Option<String>,
	#[serde(rename = "relatedNodes", default)]
	pub related_nodes: Vec<RelatedNode>,
	#[serde(rename = "relevantEdges", default)]
	pub relevant_edges: Vec<RelevantEdge>,
}

/// Per-origin-id context cache entry.
#[derive(Clone, Debug, PartialEq)]
pub enum ContextEntry {
	Loading,
	Ready(NodeContext),
	Failed(String),
}

/// Keyed context cache. A late response commits into its own key, so it can
/// never clobber the entry of a different, now-active selection.
#[derive(Clone, Debug, Default)]
pub struct ContextCache {
	entries: HashMap<String, ContextEntry>,
}

impl ContextCache {
	/// Mark `origin_id` as loading. Returns false when an entry already
	/// exists (cached or in flight) and no new fetch should start.
	pub(crate) fn begin(&mut self, origin_id: &str) -> bool {
		if self.entries.contains_key(origin_id) {
			return false;
		}
		self.entries.insert(origin_id.to_string(), ContextEntry::Loading);
		true
	}

	/// Commit a context result; discarded unless the key is still loading.
	pub(crate) fn resolve(&mut self, origin_id: &str, result: Result<NodeContext, String>) -> bool {
		match self.entries.get(origin_id) {
			Some(ContextEntry::Loading) => {}
			_ => {
				debug!("discarding context result for inactive origin {origin_id}");
				return false;
			}
		}
		let entry = match result {
			Ok(context) => ContextEntry::Ready(context),
			Err(message) => {
				warn!("context fetch for {origin_id} failed: {message}");
				ContextEntry::Failed(message)
			}
		};
		self.entries.insert(origin_id.to_string(), entry);
		true
	}

	pub fn get(&self, origin_id: &str) -> Option<&ContextEntry> {
		self.entries.get(origin_id)
	}

	/// Drop every entry except the one for `origin_id`.
	pub(crate) fn retain_only(&mut self, origin_id: Option<&str>) {
		self.entries.retain(|key, _| Some(key.as_str()) == origin_id);
	}

	pub(crate) fn clear(&mut self) {
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stale_ticket_is_discarded() {
		let mut slot: FetchSlot<u32> = FetchSlot::default();
		let stale = slot.begin();
		let current = slot.begin();
		assert!(!slot.resolve(stale, Ok(vec![1, 2, 3])));
		assert!(slot.items().is_empty());
		assert!(slot.is_fetching());
		assert!(slot.resolve(current, Ok(vec![9])));
		assert_eq!(slot.items(), &[9]);
		assert!(!slot.is_fetching());
	}

	#[test]
	fn clear_invalidates_in_flight_ticket() {
		let mut slot: FetchSlot<u32> = FetchSlot::default();
		let ticket = slot.begin();
		slot.clear();
		assert!(!slot.resolve(ticket, Ok(vec![1])));
		assert!(slot.items().is_empty());
		assert!(!slot.is_fetching());
	}

	#[test]
	fn failure_clears_list_and_flag() {
		let mut slot: FetchSlot<u32> = FetchSlot::default();
		let ticket = slot.begin();
		assert!(slot.resolve(ticket, Err("boom".into())));
		assert!(slot.items().is_empty());
		assert!(!slot.is_fetching());
		assert_eq!(slot.error(), Some("boom"));
	}

	#[test]
	fn context_cache_commits_only_while_loading() {
		let mut cache = ContextCache::default();
		assert!(cache.begin("ki:concept:a"));
		// a second begin for the same key does not refetch
		assert!(!cache.begin("ki:concept:a"));
		assert!(cache.resolve("ki:concept:a", Ok(NodeContext::default())));
		assert!(matches!(cache.get("ki:concept:a"), Some(ContextEntry::Ready(_))));
		// a response for a key that was cleared is dropped
		cache.clear();
		assert!(!cache.resolve("ki:concept:a", Ok(NodeContext::default())));
		assert!(cache.get("ki:concept:a").is_none());
	}

	#[test]
	fn retain_only_keeps_active_entry() {
		let mut cache = ContextCache::default();
		cache.begin("a");
		cache.begin("b");
		cache.retain_only(Some("b"));
		assert!(cache.get("a").is_none());
		assert!(cache.get("b").is_some());
	}
}
