//! Canonical node/edge schema shared by every view and the API boundary.

use serde::{Deserialize, Serialize};

/// Closed set of node kinds placeable on the canvas.
///
/// The wire tags are the upper-cased kind names; the backend ontology
/// spellings (`SCHOOL_OF_THOUGHT`, `WORK`) are accepted as aliases on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
	Concept,
	Axiom,
	#[serde(alias = "SCHOOL_OF_THOUGHT")]
	School,
	Metaphor,
	Thinker,
	#[serde(alias = "WORK")]
	Source,
	Synthesis,
}

impl NodeKind {
	/// Upper-cased tag used in request payloads.
	pub fn wire_tag(self) -> &'static str {
		match self {
			NodeKind::Concept => "CONCEPT",
			NodeKind::Axiom => "AXIOM",
			NodeKind::School => "SCHOOL",
			NodeKind::Metaphor => "METAPHOR",
			NodeKind::Thinker => "THINKER",
			NodeKind::Source => "SOURCE",
			NodeKind::Synthesis => "SYNTHESIS",
		}
	}

	/// Parse a wire tag, tolerating backend ontology spellings.
	/// Unknown tags fall back to [`NodeKind::Concept`].
	pub fn from_wire(tag: &str) -> NodeKind {
		match tag {
			"CONCEPT" => NodeKind::Concept,
			"AXIOM" => NodeKind::Axiom,
			"SCHOOL" | "SCHOOL_OF_THOUGHT" => NodeKind::School,
			"METAPHOR" => NodeKind::Metaphor,
			"THINKER" => NodeKind::Thinker,
			"SOURCE" | "WORK" => NodeKind::Source,
			"SYNTHESIS" => NodeKind::Synthesis,
			_ => NodeKind::Concept,
		}
	}

	/// Display name, e.g. `"Concept"`.
	pub fn display_name(self) -> &'static str {
		match self {
			NodeKind::Concept => "Concept",
			NodeKind::Axiom => "Axiom",
			NodeKind::School => "School",
			NodeKind::Metaphor => "Metaphor",
			NodeKind::Thinker => "Thinker",
			NodeKind::Source => "Source",
			NodeKind::Synthesis => "Synthesis",
		}
	}

	/// Default label for freshly placed nodes: `"New <kind>"`.
	pub fn default_label(self) -> String {
		format!("New {}", self.display_name())
	}

	pub fn default_color(self) -> &'static str {
		match self {
			NodeKind::Concept => "#1f77b4",
			NodeKind::Axiom => "#d62728",
			NodeKind::School => "#9467bd",
			NodeKind::Metaphor => "#e377c2",
			NodeKind::Thinker => "#ff7f0e",
			NodeKind::Source => "#8c564b",
			NodeKind::Synthesis => "#17becf",
		}
	}

	pub fn default_scale(self) -> f64 {
		match self {
			NodeKind::Synthesis => 1.4,
			NodeKind::School => 1.2,
			_ => 1.0,
		}
	}
}

/// User-assignable semantic relationship tags for canvas edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemanticType {
	SynthesizesWith,
	ResonatesWith,
	IsAnalogousTo,
	IsMetaphorFor,
	Illustrates,
	Defines,
	Opposes,
	ContradictsClaim,
	ChallengesPremiseOf,
	Refutes,
	Limits,
	GeneratesParadoxFrom,
	ResolvesTensionBetween,
	Enables,
	Causes,
	Influences,
	Amplifies,
	ReducesTo,
	DerivesFrom,
	IsComponentOf,
	IsAxiomFor,
	Symbolizes,
	RelatedTo,
}

/// Full relationship catalogue in chooser display order, generic fallback last.
pub const SEMANTIC_CATALOGUE: &[SemanticType] = &[
	SemanticType::SynthesizesWith,
	SemanticType::ResonatesWith,
	SemanticType::IsAnalogousTo,
	SemanticType::IsMetaphorFor,
	SemanticType::Illustrates,
	SemanticType::Defines,
	SemanticType::Opposes,
	SemanticType::ContradictsClaim,
	SemanticType::ChallengesPremiseOf,
	SemanticType::Refutes,
	SemanticType::Limits,
	SemanticType::GeneratesParadoxFrom,
	SemanticType::ResolvesTensionBetween,
	SemanticType::Enables,
	SemanticType::Causes,
	SemanticType::Influences,
	SemanticType::Amplifies,
	SemanticType::ReducesTo,
	SemanticType::DerivesFrom,
	SemanticType::IsComponentOf,
	SemanticType::IsAxiomFor,
	SemanticType::Symbolizes,
	SemanticType::RelatedTo,
];

impl SemanticType {
	/// Catalogue-derived display label. Edge labels are always computed from
	/// this table, never stored, so label and type cannot disagree.
	pub fn label(self) -> &'static str {
		match self {
			SemanticType::SynthesizesWith => "synthesizes with",
			SemanticType::ResonatesWith => "resonates with",
			SemanticType::IsAnalogousTo => "is analogous to",
			SemanticType::IsMetaphorFor => "is metaphor for",
			SemanticType::Illustrates => "illustrates",
			SemanticType::Defines => "defines",
			SemanticType::Opposes => "opposes",
			SemanticType::ContradictsClaim => "contradicts claim",
			SemanticType::ChallengesPremiseOf => "challenges premise of",
			SemanticType::Refutes => "refutes",
			SemanticType::Limits => "limits",
			SemanticType::GeneratesParadoxFrom => "generates paradox from",
			SemanticType::ResolvesTensionBetween => "resolves tension between",
			SemanticType::Enables => "enables",
			SemanticType::Causes => "causes",
			SemanticType::Influences => "influences",
			SemanticType::Amplifies => "amplifies",
			SemanticType::ReducesTo => "reduces to",
			SemanticType::DerivesFrom => "derives from",
			SemanticType::IsComponentOf => "is component of",
			SemanticType::IsAxiomFor => "is axiom for",
			SemanticType::Symbolizes => "symbolizes",
			SemanticType::RelatedTo => "related to",
		}
	}

	pub fn wire_tag(self) -> &'static str {
		match self {
			SemanticType::SynthesizesWith => "SYNTHESIZES_WITH",
			SemanticType::ResonatesWith => "RESONATES_WITH",
			SemanticType::IsAnalogousTo => "IS_ANALOGOUS_TO",
			SemanticType::IsMetaphorFor => "IS_METAPHOR_FOR",
			SemanticType::Illustrates => "ILLUSTRATES",
			SemanticType::Defines => "DEFINES",
			SemanticType::Opposes => "OPPOSES",
			SemanticType::ContradictsClaim => "CONTRADICTS_CLAIM",
			SemanticType::ChallengesPremiseOf => "CHALLENGES_PREMISE_OF",
			SemanticType::Refutes => "REFUTES",
			SemanticType::Limits => "LIMITS",
			SemanticType::GeneratesParadoxFrom => "GENERATES_PARADOX_FROM",
			SemanticType::ResolvesTensionBetween => "RESOLVES_TENSION_BETWEEN",
			SemanticType::Enables => "ENABLES",
			SemanticType::Causes => "CAUSES",
			SemanticType::Influences => "INFLUENCES",
			SemanticType::Amplifies => "AMPLIFIES",
			SemanticType::ReducesTo => "REDUCES_TO",
			SemanticType::DerivesFrom => "DERIVES_FROM",
			SemanticType::IsComponentOf => "IS_COMPONENT_OF",
			SemanticType::IsAxiomFor => "IS_AXIOM_FOR",
			SemanticType::Symbolizes => "SYMBOLIZES",
			SemanticType::RelatedTo => "RELATED_TO",
		}
	}

	/// Parse a wire tag; unknown tags are `None` rather than a fallback so
	/// callers can drop unrecognized suggestions instead of mislabeling them.
	pub fn from_wire(tag: &str) -> Option<SemanticType> {
		SEMANTIC_CATALOGUE
			.iter()
			.copied()
			.find(|t| t.wire_tag() == tag)
	}
}

impl Default for SemanticType {
	fn default() -> Self {
		SemanticType::RelatedTo
	}
}

/// 2D canvas position. Every node carries a finite position at all times;
/// the store sanitizes or rejects anything else at its boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Position {
		Position { x, y }
	}

	pub fn is_finite(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}

	/// Non-finite coordinates collapse to the origin.
	pub fn sanitized(self) -> Position {
		if self.is_finite() {
			self
		} else {
			Position::default()
		}
	}

	pub fn offset(self, dx: f64, dy: f64) -> Position {
		Position {
			x: self.x + dx,
			y: self.y + dy,
		}
	}
}

/// Pan/zoom state of the canvas, persisted alongside the graph.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	pub x: f64,
	pub y: f64,
	pub zoom: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Viewport {
			x: 0.0,
			y: 0.0,
			zoom: 1.0,
		}
	}
}

impl Viewport {
	pub fn is_valid(&self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.zoom.is_finite() && self.zoom > 0.0
	}
}

/// How a node came to exist on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
	#[default]
	UserCreated,
	Seed,
	Search,
	Suggestion,
	Synthesis,
	Fork,
}

/// Backend explanation of a synthesized concept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutput {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub parent_node_ids: Vec<String>,
	#[serde(default)]
	pub status: String,
}

/// One entity contributing to a synthesis lineage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageItem {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub contribution: Option<String>,
	#[serde(default)]
	pub connection_via: Option<String>,
}

/// Axioms and core metaphors underlying a synthesized concept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FoundationalElements {
	#[serde(default)]
	pub underlying_axioms: Vec<LineageItem>,
	#[serde(default)]
	pub core_metaphors: Vec<LineageItem>,
}

/// Intellectual lineage of a synthesized concept, rendered by the inspector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageReport {
	#[serde(default)]
	pub synthesized_concept_id: String,
	#[serde(default)]
	pub direct_parents: Vec<LineageItem>,
	#[serde(default)]
	pub key_influencers: Vec<LineageItem>,
	#[serde(default)]
	pub schools_and_epochs: Vec<LineageItem>,
	#[serde(default)]
	pub foundational_elements: FoundationalElements,
	#[serde(default)]
	pub semantic_resonances: Vec<LineageItem>,
}

/// A typed concept node on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: String,
	pub kind: NodeKind,
	pub label: String,
	pub position: Position,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scale: Option<f64>,
	/// Back-reference to a canonical knowledge-base record; absence silently
	/// disables context/suggestion lookups for this node.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	#[serde(default)]
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<f64>,
	#[serde(default)]
	pub source: Provenance,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub synthesis_output: Option<SynthesisOutput>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lineage_report: Option<LineageReport>,
	/// Transient canvas multi-select flag, never persisted.
	#[serde(skip)]
	pub selected: bool,
}

impl Node {
	pub fn render_color(&self) -> &str {
		self.color.as_deref().unwrap_or(self.kind.default_color())
	}

	pub fn render_scale(&self) -> f64 {
		self.scale.unwrap_or(self.kind.default_scale())
	}
}

/// A committed connection between two canvas nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub id: String,
	pub source: String,
	pub target: String,
	/// `None` means the connection was drawn but not yet classified.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub semantic_type: Option<SemanticType>,
	/// Part of a synthesis explanation subgraph; rendered dashed.
	#[serde(default)]
	pub lineage: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub internal_type: Option<String>,
	#[serde(skip)]
	pub selected: bool,
}

impl Edge {
	/// Display label derived from the semantic-type catalogue.
	pub fn label(&self) -> Option<&'static str> {
		self.semantic_type.map(SemanticType::label)
	}

	pub fn touches(&self, node_id: &str) -> bool {
		self.source == node_id || self.target == node_id
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kind_wire_tags_roundtrip() {
		for kind in [
			NodeKind::Concept,
			NodeKind::Axiom,
			NodeKind::School,
			NodeKind::Metaphor,
			NodeKind::Thinker,
			NodeKind::Source,
			NodeKind::Synthesis,
		] {
			assert_eq!(NodeKind::from_wire(kind.wire_tag()), kind);
		}
	}

	#[test]
	fn kind_accepts_backend_spellings() {
		assert_eq!(NodeKind::from_wire("SCHOOL_OF_THOUGHT"), NodeKind::School);
		assert_eq!(NodeKind::from_wire("WORK"), NodeKind::Source);
		assert_eq!(NodeKind::from_wire("NARRATIVE"), NodeKind::Concept);
	}

	#[test]
	fn semantic_catalogue_is_complete_and_coherent() {
		for t in SEMANTIC_CATALOGUE {
			assert_eq!(SemanticType::from_wire(t.wire_tag()), Some(*t));
			assert!(!t.label().is_empty());
		}
		assert_eq!(SemanticType::from_wire("NOT_A_RELATION"), None);
	}

	#[test]
	fn semantic_type_serializes_as_wire_tag() {
		let json = serde_json::to_string(&SemanticType::ResonatesWith).unwrap();
		assert_eq!(json, "\"RESONATES_WITH\"");
		let parsed: SemanticType = serde_json::from_str("\"RELATED_TO\"").unwrap();
		assert_eq!(parsed, SemanticType::RelatedTo);
	}

	#[test]
	fn position_sanitizes_non_finite() {
		let p = Position::new(f64::NAN, 3.0).sanitized();
		assert!(p.is_finite());
		assert_eq!(p, Position::default());
		assert_eq!(Position::new(1.0, 2.0).sanitized(), Position::new(1.0, 2.0));
	}

	#[test]
	fn edge_label_follows_catalogue() {
		let edge = Edge {
			id: "e1".into(),
			source: "a".into(),
			target: "b".into(),
			semantic_type: Some(SemanticType::Opposes),
			lineage: false,
			internal_type: None,
			selected: false,
		};
		assert_eq!(edge.label(), Some("opposes"));
		let untyped = Edge {
			semantic_type: None,
			..edge
		};
		assert_eq!(untyped.label(), None);
	}
}
