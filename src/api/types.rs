//! Wire DTOs for the backend contract.
//!
//! Response shapes are parsed defensively: every field is defaulted, node
//! kinds arrive as free-form tags and positions may live either at the top
//! level or inside the legacy `data` payload. Mapping into the canonical
//! schema happens here so nothing downstream ever sees a wire shape.

use serde::{Deserialize, Serialize};

use crate::canvas::ident::fresh_id;
use crate::canvas::suggestions::SuggestedConcept;
use crate::canvas::types::{
	Edge, LineageReport, Node, NodeKind, Position, Provenance, SemanticType, SynthesisOutput,
};

/// 3D wire position; the canonical canvas is 2D, `z` is carried for the
/// backend and ignored on input.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct WirePosition {
	#[serde(default)]
	pub x: f64,
	#[serde(default)]
	pub y: f64,
	#[serde(default)]
	pub z: f64,
}

impl WirePosition {
	pub fn into_position(self) -> Option<Position> {
		let p = Position::new(self.x, self.y);
		p.is_finite().then_some(p)
	}

	pub fn from_position(p: Position) -> WirePosition {
		WirePosition {
			x: p.x,
			y: p.y,
			z: 0.0,
		}
	}
}

/// Flexible `data` payload attached to wire nodes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireNodeData {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<WirePosition>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub synthesis_output: Option<SynthesisOutput>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lineage_report: Option<LineageReport>,
}

/// A node as transferred to and from the backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireNode {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub label: String,
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub data: WireNodeData,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<WirePosition>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ki_id: Option<String>,
}

impl WireNode {
	/// The knowledge-base back-reference under either of its wire names.
	pub fn origin(&self) -> Option<String> {
		self.ki_id.clone().or_else(|| self.data.original_id.clone())
	}

	/// First finite position found at the top level or in the data payload.
	pub fn resolved_position(&self) -> Option<Position> {
		self.position
			.and_then(WirePosition::into_position)
			.or_else(|| self.data.position.and_then(WirePosition::into_position))
	}

	/// Map into a canonical node. A missing ID gets a generated one and a
	/// missing/non-finite position falls back to the supplied one.
	pub fn into_node(self, fallback_position: Position, provenance: Provenance) -> Node {
		let kind = NodeKind::from_wire(&self.kind);
		let position = self.resolved_position().unwrap_or(fallback_position).sanitized();
		let origin_id = self.origin();
		let label = if self.label.is_empty() {
			kind.default_label()
		} else {
			self.label
		};
		Node {
			id: if self.id.is_empty() { fresh_id() } else { self.id },
			kind,
			label,
			position,
			color: self.data.color,
			scale: None,
			origin_id,
			description: self.data.description.unwrap_or_default(),
			domain: self.data.domain,
			created_at: None,
			source: provenance,
			synthesis_output: self.data.synthesis_output,
			lineage_report: self.data.lineage_report,
			selected: false,
		}
	}

	/// Map into an advisory suggestion entry (not yet a canvas node).
	pub fn into_suggestion(self) -> SuggestedConcept {
		let origin_id = self.origin();
		SuggestedConcept {
			label: if self.label.is_empty() {
				"Unnamed concept".to_string()
			} else {
				self.label
			},
			kind: NodeKind::from_wire(&self.kind),
			origin_id,
			description: self.data.description.unwrap_or_default(),
		}
	}
}

/// An edge as transferred to and from the backend. Semantic types arrive as
/// free-form tags; unknown ones are treated as unclassified.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireEdge {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub source: String,
	#[serde(default)]
	pub target: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub semantic_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub internal_type: Option<String>,
}

impl WireEdge {
	pub fn semantic(&self) -> Option<SemanticType> {
		self.semantic_type.as_deref().and_then(SemanticType::from_wire)
	}
}

/// Nodes plus edges, as returned inside a synthesis result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireSubgraph {
	#[serde(default)]
	pub nodes: Vec<WireNode>,
	#[serde(default)]
	pub edges: Vec<WireEdge>,
}

/// `POST /synthesis/` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SynthesisResponse {
	#[serde(default)]
	pub synthesis_node: WireNode,
	#[serde(default)]
	pub lineage: WireSubgraph,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub synthesis_output: Option<SynthesisOutput>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lineage_report: Option<LineageReport>,
}

/// One node of a `POST /synthesis/` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisNodePayload {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub label: String,
	pub position: WirePosition,
	pub data: SynthesisNodeData,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ki_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SynthesisNodeData {
	#[serde(default)]
	pub description: String,
}

/// One edge of a `POST /synthesis/` request. Unclassified edges go out as
/// the generic fallback relationship.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisEdgePayload {
	pub id: String,
	pub source: String,
	pub target: String,
	pub semantic_type: SemanticType,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub internal_type: Option<String>,
}

/// `POST /synthesis/` request body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
	pub nodes: Vec<SynthesisNodePayload>,
	pub edges: Vec<SynthesisEdgePayload>,
}

impl SynthesisRequest {
	/// Build the graph-structure payload from resolved input nodes/edges.
	pub fn from_graph(nodes: &[Node], edges: &[Edge]) -> SynthesisRequest {
		SynthesisRequest {
			nodes: nodes
				.iter()
				.map(|n| SynthesisNodePayload {
					id: n.id.clone(),
					kind: n.kind.wire_tag().to_string(),
					label: n.label.clone(),
					position: WirePosition::from_position(n.position),
					data: SynthesisNodeData {
						description: n.description.clone(),
					},
					ki_id: n.origin_id.clone(),
				})
				.collect(),
			edges: edges
				.iter()
				.map(|e| SynthesisEdgePayload {
					id: e.id.clone(),
					source: e.source.clone(),
					target: e.target.clone(),
					semantic_type: e.semantic_type.unwrap_or_default(),
					internal_type: e.internal_type.clone(),
				})
				.collect(),
		}
	}
}

/// `POST /suggestions/edges` request body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeSuggestionRequest {
	pub source_type: String,
	pub target_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source_label: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_label: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source_ki_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_ki_id: Option<String>,
}

impl EdgeSuggestionRequest {
	/// The suggestion algorithm wants type, label and origin of both
	/// endpoints, so it takes the full node objects.
	pub fn for_pair(source: &Node, target: &Node) -> EdgeSuggestionRequest {
		EdgeSuggestionRequest {
			source_type: source.kind.wire_tag().to_string(),
			target_type: target.kind.wire_tag().to_string(),
			source_label: Some(source.label.clone()),
			target_label: Some(target.label.clone()),
			source_ki_id: source.origin_id.clone(),
			target_ki_id: target.origin_id.clone(),
		}
	}
}

/// Edge-type suggestions arrive either bare or wrapped.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum EdgeTypeSuggestionsWire {
	Bare(Vec<String>),
	Wrapped {
		#[serde(default)]
		suggestions: Vec<String>,
	},
}

impl EdgeTypeSuggestionsWire {
	/// Flatten to known semantic types, dropping unrecognized tags.
	pub fn into_types(self) -> Vec<SemanticType> {
		let tags = match self {
			EdgeTypeSuggestionsWire::Bare(tags) => tags,
			EdgeTypeSuggestionsWire::Wrapped { suggestions } => suggestions,
		};
		tags.iter().filter_map(|t| SemanticType::from_wire(t)).collect()
	}
}

/// `POST /onboarding/select-archetype` request body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchetypeSelectionRequest {
	pub archetype_id: String,
}

/// `POST /onboarding/select-archetype` response body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeedConceptsResponse {
	#[serde(default)]
	pub seed_concepts: Vec<WireNode>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_node_maps_backend_shape() {
		let raw = r#"{
			"id": "ki-123",
			"type": "SCHOOL_OF_THOUGHT",
			"label": "Stoicism",
			"data": {"description": "Virtue ethics", "position": {"x": 4.0, "y": 8.0, "z": 1.5}},
			"ki_id": "ki:school:stoicism"
		}"#;
		let wire: WireNode = serde_json::from_str(raw).unwrap();
		let node = wire.into_node(Position::default(), Provenance::Search);
		assert_eq!(node.kind, NodeKind::School);
		assert_eq!(node.label, "Stoicism");
		assert_eq!(node.position, Position::new(4.0, 8.0));
		assert_eq!(node.origin_id.as_deref(), Some("ki:school:stoicism"));
		assert_eq!(node.description, "Virtue ethics");
	}

	#[test]
	fn wire_node_without_id_or_position_gets_fallbacks() {
		let wire: WireNode = serde_json::from_str(r#"{"label": "Mystery"}"#).unwrap();
		let node = wire.into_node(Position::new(7.0, 7.0), Provenance::Seed);
		assert!(!node.id.is_empty());
		assert_eq!(node.position, Position::new(7.0, 7.0));
		assert_eq!(node.kind, NodeKind::Concept);
	}

	#[test]
	fn edge_type_suggestions_accept_both_shapes() {
		let bare: EdgeTypeSuggestionsWire =
			serde_json::from_str(r#"["RESONATES_WITH", "NOT_A_TYPE"]"#).unwrap();
		assert_eq!(bare.into_types(), vec![SemanticType::ResonatesWith]);

		let wrapped: EdgeTypeSuggestionsWire =
			serde_json::from_str(r#"{"suggestions": ["OPPOSES", "RELATED_TO"]}"#).unwrap();
		assert_eq!(
			wrapped.into_types(),
			vec![SemanticType::Opposes, SemanticType::RelatedTo]
		);
	}

	#[test]
	fn synthesis_request_uppercases_kinds_and_defaults_untyped_edges() {
		let node = WireNode {
			id: "n1".into(),
			label: "A".into(),
			kind: "SOURCE".into(),
			..WireNode::default()
		}
		.into_node(Position::default(), Provenance::UserCreated);
		let edge = Edge {
			id: "e1".into(),
			source: "n1".into(),
			target: "n2".into(),
			semantic_type: None,
			lineage: false,
			internal_type: None,
			selected: false,
		};
		let request = SynthesisRequest::from_graph(&[node], &[edge]);
		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["nodes"][0]["type"], "SOURCE");
		assert_eq!(json["edges"][0]["semantic_type"], "RELATED_TO");
		assert!(json["nodes"][0]["position"]["z"].is_number());
	}
}
