//! View-local canvas state: gesture tracking, hit testing and the hover
//! highlight animation. Graph truth lives in the store; this struct only
//! remembers what the pointer is doing between events.

use std::collections::HashSet;

use crate::canvas::{CanvasStore, Position, Viewport};

pub const NODE_RADIUS: f64 = 9.0;
pub const HIT_RADIUS: f64 = 16.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_id: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub viewport_start_x: f64,
	pub viewport_start_y: f64,
	pub moved: bool,
}

/// An in-progress connection drag (phase zero of the connection protocol;
/// the store only hears about it once the pointer is released on a target).
#[derive(Clone, Debug, Default)]
pub struct LinkState {
	pub active: bool,
	pub source_id: Option<String>,
	pub cursor_x: f64,
	pub cursor_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
}

pub struct CanvasView {
	pub drag: DragState,
	pub pan: PanState,
	pub link: LinkState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
}

impl CanvasView {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			drag: DragState::default(),
			pan: PanState::default(),
			link: LinkState::default(),
			hover: HoverState::default(),
			width,
			height,
		}
	}

	pub fn screen_to_graph(&self, viewport: Viewport, sx: f64, sy: f64) -> (f64, f64) {
		((sx - viewport.x) / viewport.zoom, (sy - viewport.y) / viewport.zoom)
	}

	/// Topmost node under the pointer, if any. Hit radius scales with the
	/// node's render scale like the node itself does.
	pub fn node_at_position(&self, store: &CanvasStore, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(store.viewport(), sx, sy);
		let mut found = None;
		for node in store.nodes() {
			let (dx, dy) = (node.position.x - gx, node.position.y - gy);
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS * node.render_scale() {
				found = Some(node.id.clone());
			}
		}
		found
	}

	/// Topmost edge whose segment passes near the pointer. Checked only
	/// after node hit testing misses, so nodes win overlaps.
	pub fn edge_at_position(&self, store: &CanvasStore, sx: f64, sy: f64) -> Option<String> {
		let viewport = store.viewport();
		let (gx, gy) = self.screen_to_graph(viewport, sx, sy);
		let slop = 6.0 / viewport.zoom.max(0.1);
		let mut found = None;
		for edge in store.edges() {
			let (Some(n1), Some(n2)) = (store.node(&edge.source), store.node(&edge.target)) else {
				continue;
			};
			let (x1, y1, x2, y2) = (n1.position.x, n1.position.y, n2.position.x, n2.position.y);
			let (dx, dy) = (x2 - x1, y2 - y1);
			let len_sq = dx * dx + dy * dy;
			if len_sq < 0.001 {
				continue;
			}
			let t = (((gx - x1) * dx + (gy - y1) * dy) / len_sq).clamp(0.0, 1.0);
			let (cx, cy) = (x1 + t * dx, y1 + t * dy);
			let (ex, ey) = (gx - cx, gy - cy);
			if (ex * ex + ey * ey).sqrt() < slop {
				found = Some(edge.id.clone());
			}
		}
		found
	}

	pub fn set_hover(&mut self, store: &CanvasStore, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.neighbors.clear();
		if let Some(id) = &self.hover.node {
			for edge in store.edges() {
				if edge.source == *id {
					self.hover.neighbors.insert(edge.target.clone());
				} else if edge.target == *id {
					self.hover.neighbors.insert(edge.source.clone());
				}
			}
		}
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.neighbors.contains(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some()
	}

	/// Advance the hover highlight toward its target each frame.
	pub fn tick(&mut self, dt: f64) {
		let (target, speed) = if self.hover.node.is_some() {
			(1.0, 1.8)
		} else {
			(0.0, 1.26)
		};
		self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
			self.hover.neighbors.clear();
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
