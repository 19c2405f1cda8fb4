//! End-to-end scenarios over the graph engine: a user session exercised as
//! one operation sequence, with the structural invariants checked after
//! every step.

use knowledge_canvas::api::types::{SynthesisResponse, WireEdge, WireNode, WireSubgraph};
use knowledge_canvas::canvas::{
	CanvasStore, Connection, EdgeDraft, NodeChange, NodeDraft, NodeKind, PendingConnection,
	Position, Selection, SemanticType,
};

fn assert_invariants(store: &CanvasStore) {
	// no dangling edges
	for edge in store.edges() {
		assert!(store.node(&edge.source).is_some(), "dangling source in {}", edge.id);
		assert!(store.node(&edge.target).is_some(), "dangling target in {}", edge.id);
		assert_ne!(edge.source, edge.target, "self-loop {}", edge.id);
	}
	// every position finite
	for node in store.nodes() {
		assert!(node.position.is_finite(), "non-finite position on {}", node.id);
	}
	// label/type coherence is structural: the label is derived from the
	// catalogue, so checking it here is checking the lookup stays total
	for edge in store.edges() {
		if let Some(semantic_type) = edge.semantic_type {
			assert_eq!(edge.label(), Some(semantic_type.label()));
		}
	}
}

#[test]
fn full_session_walkthrough() {
	let mut store = CanvasStore::new();

	// seed a few concepts the way onboarding does
	let seeds: Vec<_> = ["Transformation", "Essence", "Catalyst"]
		.iter()
		.enumerate()
		.map(|(i, label)| {
			store.add_node(
				NodeKind::Concept,
				Position::new(i as f64 * 120.0, 40.0),
				NodeDraft {
					label: Some(label.to_string()),
					origin_id: Some(format!("ki:concept:{}", label.to_lowercase())),
					..NodeDraft::default()
				},
			)
		})
		.collect();
	assert_invariants(&store);

	// draw and confirm a connection
	store.set_pending_connection(Some(PendingConnection::new(
		seeds[0].id.clone(),
		seeds[1].id.clone(),
	)));
	let edge = store
		.confirm_relationship_selection(SemanticType::Enables)
		.expect("edge committed");
	assert_invariants(&store);
	assert_eq!(store.edges().len(), 1);

	// focus the edge, then synthesize from it (priority 3: endpoint pair)
	store.select_edge(&edge.id);
	let selection = store.begin_synthesis().expect("edge focus resolves to its endpoints");
	assert_eq!(selection.nodes.len(), 2);
	assert_eq!(selection.edges.len(), 1);

	// server responds without a position; merge must fabricate one
	let response = SynthesisResponse {
		synthesis_node: WireNode {
			id: "syn-42".into(),
			label: "Alchemy".into(),
			kind: "SYNTHESIS".into(),
			..WireNode::default()
		},
		lineage: WireSubgraph {
			nodes: vec![WireNode {
				id: "lin-1".into(),
				label: "Hermes Trismegistus".into(),
				kind: "THINKER".into(),
				..WireNode::default()
			}],
			edges: vec![WireEdge {
				id: "lin-e1".into(),
				source: "syn-42".into(),
				target: "lin-1".into(),
				semantic_type: Some("DERIVES_FROM".into()),
				internal_type: None,
			}],
		},
		synthesis_output: None,
		lineage_report: None,
	};
	store.apply_synthesis(response.clone());
	assert_invariants(&store);
	assert_eq!(*store.selection(), Selection::Node("syn-42".into()));
	let synthesis = store.node("syn-42").unwrap();
	assert_eq!(synthesis.kind, NodeKind::Synthesis);
	assert!(synthesis.position.is_finite());

	// merging the same response again must not grow the graph
	let (nodes_before, edges_before) = (store.nodes().len(), store.edges().len());
	store.select_node(&seeds[0].id);
	store.apply_node_changes(vec![NodeChange::Select {
		id: seeds[0].id.clone(),
		selected: true,
	}]);
	store.begin_synthesis().unwrap();
	store.apply_synthesis(response);
	assert_eq!(store.nodes().len(), nodes_before);
	assert_eq!(store.edges().len(), edges_before);
	assert_invariants(&store);

	// fork the synthesis, then delete the original; the fork survives
	let forked = store.fork_synthesis_node("syn-42").expect("forkable");
	assert_invariants(&store);
	store.delete_node("syn-42");
	assert_invariants(&store);
	assert!(store.node(&forked).is_some());
	assert_eq!(store.node(&forked).unwrap().kind, NodeKind::Synthesis);

	// cascade delete cleans up everything the seed touches
	store.add_edge(
		&Connection::new(seeds[1].id.clone(), seeds[2].id.clone()),
		EdgeDraft {
			semantic_type: Some(SemanticType::ResonatesWith),
			..EdgeDraft::default()
		},
	);
	store.delete_node(&seeds[1].id);
	assert_invariants(&store);
	assert!(store.edges().iter().all(|e| !e.touches(&seeds[1].id)));
}

#[test]
fn selection_exclusivity_over_arbitrary_transitions() {
	let mut store = CanvasStore::new();
	let a = store.add_node(NodeKind::Concept, Position::new(0.0, 0.0), NodeDraft::default());
	let b = store.add_node(NodeKind::Axiom, Position::new(50.0, 0.0), NodeDraft::default());
	let edge = store
		.add_edge(&Connection::new(a.id.clone(), b.id.clone()), EdgeDraft::default())
		.unwrap();

	let check = |store: &CanvasStore| match store.selection() {
		Selection::None | Selection::Node(_) | Selection::Edge(_) => {
			// the sum type cannot represent node+edge at once; assert the
			// inspector visibility tracks it
			assert_eq!(
				store.inspector_open(),
				!matches!(store.selection(), Selection::None)
			);
		}
	};

	store.select_node(&a.id);
	check(&store);
	store.select_edge(&edge.id);
	check(&store);
	store.select_node(&b.id);
	check(&store);
	store.clear_selection();
	check(&store);
}

#[test]
fn bulk_seeding_is_per_item_safe() {
	let mut store = CanvasStore::new();
	let keeper = store.add_node(NodeKind::Concept, Position::new(0.0, 0.0), NodeDraft::default());

	let mut duplicate = keeper.clone();
	duplicate.label = "imposter".into();
	let mut fine = keeper.clone();
	fine.id = "fresh-1".into();

	let count_before = store.nodes().len();
	let added = store.add_nodes_bulk(vec![duplicate, fine]);
	assert_eq!(added, 1);
	assert_eq!(store.nodes().len(), count_before + 1);
	// the duplicate did not overwrite the original
	assert_ne!(store.node(&keeper.id).unwrap().label, "imposter");
}
