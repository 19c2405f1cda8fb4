//! Synthesis orchestration: resolving the input subgraph, merging the
//! backend's synthesis result (node + lineage subgraph) into the canvas and
//! the client-local fork operation.
//!
//! Merging is defensive throughout: the returned node's kind is forced to
//! `Synthesis`, a missing or non-numeric position falls back to the jittered
//! centroid of the requesting nodes, lineage entries get IDs, kinds and
//! staggered positions when the server omits them, and lineage already on
//! canvas is never duplicated.

use std::collections::HashMap;

use log::warn;
use thiserror::Error;

use crate::api::types::SynthesisResponse;

use super::ident::fresh_id;
use super::selection::{FetchPlan, Selection};
use super::store::CanvasStore;
use super::types::{Edge, Node, NodeKind, Position, Provenance};

/// Jitter applied to the centroid fallback so repeated syntheses over the
/// same region do not stack exactly.
const CENTROID_JITTER: f64 = 50.0;
/// Per-index stagger for lineage nodes the server returned without
/// positions. Cosmetic; anything avoiding exact overlap works.
const LINEAGE_STAGGER_X: f64 = 90.0;
const LINEAGE_STAGGER_Y: f64 = 70.0;
/// Offset applied to every node copied by a fork.
const FORK_OFFSET_X: f64 = 120.0;
const FORK_OFFSET_Y: f64 = 80.0;

/// Why a synthesis request could not be started.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SynthesisInputError {
	#[error("select at least one node before synthesizing")]
	EmptySelection,
	#[error("a synthesis request is already in flight")]
	AlreadyInFlight,
}

/// Loading/error state of the synthesis operation, plus the anchor
/// positions captured at request time for the fallback placement.
#[derive(Clone, Debug, Default)]
pub struct SynthesisStatus {
	pub(crate) loading: bool,
	pub(crate) error: Option<String>,
	pub(crate) anchors: Vec<Position>,
}

/// The subgraph a synthesis request is built from (cloned out of the store
/// at request time, so in-flight edits cannot tear the payload).
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisSelection {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

impl CanvasStore {
	pub fn synthesis_loading(&self) -> bool {
		self.synthesis.loading
	}

	pub fn synthesis_error(&self) -> Option<&str> {
		self.synthesis.error.as_deref()
	}

	/// Resolve the input subgraph, first non-empty source wins: canvas
	/// multi-selection, then the inspector focus, where a focused edge
	/// implies its endpoint pair.
	pub fn resolve_synthesis_input(&self) -> Option<SynthesisSelection> {
		let nodes: Vec<Node> = self.nodes.iter().filter(|n| n.selected).cloned().collect();
		if !nodes.is_empty() {
			let edges: Vec<Edge> = self.edges.iter().filter(|e| e.selected).cloned().collect();
			return Some(SynthesisSelection { nodes, edges });
		}
		match &self.selection {
			Selection::Node(id) => {
				let node = self.node(id)?.clone();
				Some(SynthesisSelection {
					nodes: vec![node],
					edges: Vec::new(),
				})
			}
			Selection::Edge(id) => {
				let edge = self.edge(id)?.clone();
				let source = self.node(&edge.source)?.clone();
				let target = self.node(&edge.target)?.clone();
				Some(SynthesisSelection {
					nodes: vec![source, target],
					edges: vec![edge],
				})
			}
			Selection::None => None,
		}
	}

	/// Start a synthesis: resolves the input, flips the loading flag and
	/// captures anchor positions for the merge fallback. Fails fast with no
	/// state change when the input is empty or a request is in flight.
	pub fn begin_synthesis(&mut self) -> Result<SynthesisSelection, SynthesisInputError> {
		if self.synthesis.loading {
			warn!("synthesis already in flight, ignoring");
			return Err(SynthesisInputError::AlreadyInFlight);
		}
		let Some(selection) = self.resolve_synthesis_input() else {
			warn!("synthesis requires at least one node");
			return Err(SynthesisInputError::EmptySelection);
		};
		self.synthesis.loading = true;
		self.synthesis.error = None;
		self.synthesis.anchors = selection.nodes.iter().map(|n| n.position).collect();
		Ok(selection)
	}

	/// Terminal failure state: loading off, error visible, graph untouched.
	/// Recoverable by a user-initiated retry.
	pub fn fail_synthesis(&mut self, message: impl Into<String>) {
		let message = message.into();
		warn!("synthesis failed: {message}");
		self.synthesis.loading = false;
		self.synthesis.error = Some(message);
		self.synthesis.anchors.clear();
	}

	/// Merge a synthesis response into the canvas and focus the new node.
	/// Returns the fetch plans of the post-merge selection (context lookup
	/// when the synthesis node carries an origin id).
	pub fn apply_synthesis(&mut self, response: SynthesisResponse) -> Vec<FetchPlan> {
		let SynthesisResponse {
			mut synthesis_node,
			lineage,
			synthesis_output,
			lineage_report,
		} = response;

		// explanation payloads may ride at the top level
		if synthesis_node.data.synthesis_output.is_none() {
			synthesis_node.data.synthesis_output = synthesis_output;
		}
		if synthesis_node.data.lineage_report.is_none() {
			synthesis_node.data.lineage_report = lineage_report;
		}
		if synthesis_node.label.is_empty() {
			if let Some(output) = &synthesis_node.data.synthesis_output {
				synthesis_node.label = output.name.clone();
			}
		}

		let fallback = self.centroid_fallback();
		let mut node = synthesis_node.into_node(fallback, Provenance::Synthesis);
		node.kind = NodeKind::Synthesis;

		let anchor = if let Some(existing) = self.node(&node.id) {
			// re-applying a result already on canvas: nothing to re-add
			existing.position
		} else {
			self.nodes.push(node.clone());
			node.position
		};

		let lineage_nodes: Vec<Node> = lineage
			.nodes
			.into_iter()
			.enumerate()
			.map(|(index, wire)| {
				let stagger = anchor.offset(
					LINEAGE_STAGGER_X * (((index % 4) as f64) - 1.5),
					LINEAGE_STAGGER_Y * ((index / 4 + 1) as f64),
				);
				wire.into_node(stagger, Provenance::Synthesis)
			})
			.collect();
		self.add_nodes_bulk(lineage_nodes);

		let lineage_edges: Vec<Edge> = lineage
			.edges
			.into_iter()
			.map(|wire| Edge {
				id: if wire.id.is_empty() { fresh_id() } else { wire.id.clone() },
				semantic_type: wire.semantic(),
				source: wire.source,
				target: wire.target,
				lineage: true,
				internal_type: Some(wire.internal_type.unwrap_or_else(|| "RELATED_TO".to_string())),
				selected: false,
			})
			.collect();
		self.add_edges_bulk(lineage_edges);

		self.synthesis.loading = false;
		self.synthesis.error = None;
		self.synthesis.anchors.clear();
		self.touch();
		self.select_node(&node.id)
	}

	/// Centroid of the anchor positions captured at request time, jittered
	/// by up to ±[`CENTROID_JITTER`] per axis.
	fn centroid_fallback(&mut self) -> Position {
		let anchors = std::mem::take(&mut self.synthesis.anchors);
		let centroid = if anchors.is_empty() {
			Position::new(self.viewport.x, self.viewport.y)
		} else {
			let n = anchors.len() as f64;
			Position::new(
				anchors.iter().map(|p| p.x).sum::<f64>() / n,
				anchors.iter().map(|p| p.y).sum::<f64>() / n,
			)
		};
		let dx = (self.next_unit() - 0.5) * 2.0 * CENTROID_JITTER;
		let dy = (self.next_unit() - 0.5) * 2.0 * CENTROID_JITTER;
		centroid.offset(dx, dy).sanitized()
	}

	/// Duplicate a synthesis node and its direct children into a fresh,
	/// independent subgraph. Edge topology is preserved among the copied set
	/// only; the original subgraph is never mutated. Returns the new root's
	/// ID.
	pub fn fork_synthesis_node(&mut self, id: &str) -> Option<String> {
		let Some(root) = self.node(id) else {
			warn!("fork: no node {id}");
			return None;
		};
		if root.kind != NodeKind::Synthesis {
			warn!("fork: node {id} is not a synthesis node");
			return None;
		}

		let mut remap: HashMap<String, String> = HashMap::new();
		remap.insert(id.to_string(), fresh_id());
		for edge in &self.edges {
			if edge.source == id {
				remap.entry(edge.target.clone()).or_insert_with(fresh_id);
			}
		}

		let copies: Vec<Node> = remap
			.iter()
			.filter_map(|(old, new)| {
				let original = self.node(old)?;
				let mut copy = original.clone();
				copy.id = new.clone();
				copy.position = original.position.offset(FORK_OFFSET_X, FORK_OFFSET_Y);
				copy.source = Provenance::Fork;
				copy.selected = false;
				Some(copy)
			})
			.collect();

		let edge_copies: Vec<Edge> = self
			.edges
			.iter()
			.filter_map(|edge| {
				let source = remap.get(&edge.source)?;
				let target = remap.get(&edge.target)?;
				let mut copy = edge.clone();
				copy.id = fresh_id();
				copy.source = source.clone();
				copy.target = target.clone();
				copy.selected = false;
				Some(copy)
			})
			.collect();

		let new_root = remap.remove(id);
		self.add_nodes_bulk(copies);
		self.add_edges_bulk(edge_copies);
		new_root
	}
}
