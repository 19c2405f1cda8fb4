//! Local snapshot persistence: nodes, edges and viewport serialized to a
//! key-value backend across sessions.
//!
//! Reads are defensive: a snapshot that fails to parse, carries an unknown
//! schema version or contains invalid entries degrades to the empty/default
//! state (or drops the offending entries) instead of failing the app.
//! Restoring goes through the store's bulk mutations, so every insertion
//! invariant holds for persisted data exactly as it does for live data.

use log::warn;
use serde::{Deserialize, Serialize};

use super::store::CanvasStore;
use super::types::{Edge, Node, Viewport};

/// Key under which the combined snapshot is stored.
pub const SNAPSHOT_KEY: &str = "knowledge-canvas.snapshot";

/// Bursts of mutations within this window coalesce into one write.
pub const SNAPSHOT_DEBOUNCE_MS: u32 = 300;

const SNAPSHOT_VERSION: u32 = 1;

/// Minimal key-value persistence seam; the browser build backs it with
/// `localStorage`, tests with an in-memory map.
pub trait SnapshotBackend {
	fn read(&self) -> Option<String>;
	fn write(&self, snapshot: &str);
}

/// Serialized form of the persisted canvas state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
	version: u32,
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	viewport: Viewport,
}

impl Snapshot {
	pub fn capture(store: &CanvasStore) -> Snapshot {
		Snapshot {
			version: SNAPSHOT_VERSION,
			nodes: store.nodes().to_vec(),
			edges: store.edges().to_vec(),
			viewport: store.viewport(),
		}
	}

	pub fn to_json(&self) -> Option<String> {
		match serde_json::to_string(self) {
			Ok(json) => Some(json),
			Err(err) => {
				warn!("failed to serialize snapshot: {err}");
				None
			}
		}
	}

	/// Parse a stored snapshot; shape or version mismatches yield `None`.
	pub fn from_json(raw: &str) -> Option<Snapshot> {
		let snapshot: Snapshot = match serde_json::from_str(raw) {
			Ok(snapshot) => snapshot,
			Err(err) => {
				warn!("stored snapshot does not match the expected schema: {err}");
				return None;
			}
		};
		if snapshot.version != SNAPSHOT_VERSION {
			warn!(
				"stored snapshot has version {}, expected {SNAPSHOT_VERSION}; starting fresh",
				snapshot.version
			);
			return None;
		}
		Some(snapshot)
	}

	/// Replace the store's contents with this snapshot. Invalid entries are
	/// dropped by the bulk mutations rather than failing the restore.
	pub fn restore_into(self, store: &mut CanvasStore) {
		store.reset();
		store.add_nodes_bulk(self.nodes);
		store.add_edges_bulk(self.edges);
		if self.viewport.is_valid() {
			store.set_viewport(self.viewport);
		}
	}
}

/// Read the backend and restore into the store; missing or malformed data
/// leaves the store in its default state.
pub fn restore(store: &mut CanvasStore, backend: &dyn SnapshotBackend) {
	let Some(raw) = backend.read() else {
		return;
	};
	let Some(snapshot) = Snapshot::from_json(&raw) else {
		return;
	};
	snapshot.restore_into(store);
}

/// Capture the store and write it to the backend.
pub fn persist(store: &CanvasStore, backend: &dyn SnapshotBackend) {
	if let Some(json) = Snapshot::capture(store).to_json() {
		backend.write(&json);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use super::super::store::test_support::{assert_no_dangling, store_with_nodes};
	use super::super::store::{Connection, EdgeDraft};
	use super::super::types::{Position, SemanticType};
	use super::*;

	#[derive(Default)]
	struct MemoryBackend {
		slot: RefCell<Option<String>>,
	}

	impl SnapshotBackend for MemoryBackend {
		fn read(&self) -> Option<String> {
			self.slot.borrow().clone()
		}

		fn write(&self, snapshot: &str) {
			*self.slot.borrow_mut() = Some(snapshot.to_string());
		}
	}

	#[test]
	fn snapshot_roundtrip_preserves_graph_and_viewport() {
		let (mut store, ids) = store_with_nodes(3);
		store
			.add_edge(
				&Connection::new(ids[0].clone(), ids[1].clone()),
				EdgeDraft {
					semantic_type: Some(SemanticType::Influences),
					..EdgeDraft::default()
				},
			)
			.unwrap();
		store.set_viewport(Viewport {
			x: -40.0,
			y: 25.0,
			zoom: 1.5,
		});

		let backend = MemoryBackend::default();
		persist(&store, &backend);

		let mut restored = CanvasStore::new();
		restore(&mut restored, &backend);
		assert_eq!(restored.nodes().len(), 3);
		assert_eq!(restored.edges().len(), 1);
		assert_eq!(restored.edges()[0].semantic_type, Some(SemanticType::Influences));
		assert_eq!(restored.edges()[0].label(), Some("influences"));
		assert_eq!(restored.viewport().zoom, 1.5);
		assert_no_dangling(&restored);
	}

	#[test]
	fn malformed_snapshot_falls_back_to_empty() {
		let backend = MemoryBackend::default();
		backend.write("{\"definitely\": \"not a snapshot\"}");
		let mut store = CanvasStore::new();
		restore(&mut store, &backend);
		assert!(store.is_empty());

		backend.write("not json at all");
		restore(&mut store, &backend);
		assert!(store.is_empty());
	}

	#[test]
	fn version_mismatch_is_rejected() {
		let (store, _) = store_with_nodes(1);
		let mut snapshot = Snapshot::capture(&store);
		snapshot.version = 99;
		let raw = snapshot.to_json().unwrap();
		assert!(Snapshot::from_json(&raw).is_none());
	}

	#[test]
	fn restore_drops_dangling_edges() {
		let (mut store, ids) = store_with_nodes(2);
		store.add_edge(&Connection::new(ids[0].clone(), ids[1].clone()), EdgeDraft::default());
		let mut snapshot = Snapshot::capture(&store);
		// simulate a snapshot corrupted by a partial write
		snapshot.nodes.remove(0);
		let raw = snapshot.to_json().unwrap();

		let mut restored = CanvasStore::new();
		Snapshot::from_json(&raw).unwrap().restore_into(&mut restored);
		assert_eq!(restored.nodes().len(), 1);
		assert!(restored.edges().is_empty());
		assert_no_dangling(&restored);
	}

	#[test]
	fn restore_replaces_previous_contents() {
		let (mut store, _) = store_with_nodes(1);
		let snapshot = Snapshot::capture(&store);
		let raw = snapshot.to_json().unwrap();

		let (mut target, _) = store_with_nodes(3);
		target.add_node(
			super::super::types::NodeKind::Axiom,
			Position::new(9.0, 9.0),
			Default::default(),
		);
		Snapshot::from_json(&raw).unwrap().restore_into(&mut target);
		assert_eq!(target.nodes().len(), 1);
	}
}
