//! Canvas 2D rendering of the store state: kind-colored nodes, typed edges
//! with arrowheads, dashed lineage edges, selection rings and the pending
//! connection line.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::canvas::{CanvasStore, Selection};

use super::state::{CanvasView, NODE_RADIUS};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(store: &CanvasStore, view: &CanvasView, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, view.width, view.height);
	ctx.save();
	let viewport = store.viewport();
	let _ = ctx.translate(viewport.x, viewport.y);
	let _ = ctx.scale(viewport.zoom, viewport.zoom);
	draw_edges(store, view, ctx);
	draw_link_drag(store, view, ctx);
	draw_pending(store, ctx);
	draw_nodes(store, view, ctx);
	ctx.restore();
}

fn node_radius(store: &CanvasStore, id: &str) -> f64 {
	store
		.node(id)
		.map(|n| NODE_RADIUS * n.render_scale())
		.unwrap_or(NODE_RADIUS)
}

fn draw_edges(store: &CanvasStore, view: &CanvasView, ctx: &CanvasRenderingContext2d) {
	let k = store.viewport().zoom;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 6.0 / k, 4.0 / k, 8.0 / k);
	let t = ease_out_cubic(view.hover.highlight_t);
	let focused = match store.selection() {
		Selection::Edge(id) => Some(id.as_str()),
		_ => None,
	};

	for edge in store.edges() {
		let (Some(n1), Some(n2)) = (store.node(&edge.source), store.node(&edge.target)) else {
			continue;
		};
		let (x1, y1, x2, y2) = (n1.position.x, n1.position.y, n2.position.x, n2.position.y);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_focused = focused == Some(edge.id.as_str()) || edge.selected;
		let is_highlighted = view.is_highlighted(&edge.source) && view.is_highlighted(&edge.target);

		let alpha = if is_focused {
			0.95
		} else if is_highlighted {
			0.6 + 0.3 * t
		} else {
			0.6 - 0.45 * t
		};
		let color = if edge.lineage {
			format!("rgba(167, 139, 250, {alpha})")
		} else {
			format!("rgba(100, 180, 255, {alpha})")
		};
		ctx.set_stroke_style_str(&color);
		ctx.set_line_width(if is_focused { line_width * 1.8 } else { line_width });

		if edge.lineage {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let (r1, r2) = (node_radius(store, &edge.source), node_radius(store, &edge.target));
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + arrow_size), y2 - uy * (r2 + arrow_size));
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&color);
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if k >= 0.75 {
			if let Some(label) = edge.label() {
				let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
				ctx.set_fill_style_str(&format!("rgba(220, 230, 255, {})", alpha * 0.9));
				ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
				let _ = ctx.fill_text(label, mx + 4.0 / k, my - 4.0 / k);
			}
		}
	}
}

/// The live drag from a source node toward the pointer, before release.
fn draw_link_drag(store: &CanvasStore, view: &CanvasView, ctx: &CanvasRenderingContext2d) {
	if !view.link.active {
		return;
	}
	let Some(source) = view.link.source_id.as_deref().and_then(|id| store.node(id)) else {
		return;
	};
	let k = store.viewport().zoom;
	ctx.set_stroke_style_str("rgba(250, 204, 21, 0.8)");
	ctx.set_line_width(1.5 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(5.0 / k),
		&JsValue::from_f64(5.0 / k),
	));
	ctx.begin_path();
	ctx.move_to(source.position.x, source.position.y);
	ctx.line_to(view.link.cursor_x, view.link.cursor_y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

/// The released-but-unconfirmed connection, drawn while the relationship
/// chooser is open.
fn draw_pending(store: &CanvasStore, ctx: &CanvasRenderingContext2d) {
	let Some(pending) = store.pending_connection() else {
		return;
	};
	let (Some(n1), Some(n2)) = (store.node(&pending.source), store.node(&pending.target)) else {
		return;
	};
	let k = store.viewport().zoom;
	ctx.set_stroke_style_str("rgba(250, 204, 21, 0.9)");
	ctx.set_line_width(2.0 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(4.0 / k),
		&JsValue::from_f64(4.0 / k),
	));
	ctx.begin_path();
	ctx.move_to(n1.position.x, n1.position.y);
	ctx.line_to(n2.position.x, n2.position.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(store: &CanvasStore, view: &CanvasView, ctx: &CanvasRenderingContext2d) {
	let k = store.viewport().zoom;
	let t = ease_out_cubic(view.hover.highlight_t);
	let has_highlight = view.has_active_highlight();
	let focused = match store.selection() {
		Selection::Node(id) => Some(id.as_str()),
		_ => None,
	};

	for node in store.nodes() {
		let radius = NODE_RADIUS * node.render_scale();
		let (x, y) = (node.position.x, node.position.y);
		let is_hovered = view.hover.node.as_deref() == Some(node.id.as_str());
		let is_highlighted = view.is_highlighted(&node.id);
		let dimmed = has_highlight && !is_highlighted;

		if is_hovered && t > 0.01 {
			let glow_radius = radius * (1.8 + 1.2 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius)
			{
				let alpha = 0.35 * t;
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
				let _ = gradient
					.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		let alpha = if dimmed { 1.0 - 0.7 * t } else { 1.0 };
		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.render_color());
		ctx.fill();
		ctx.set_global_alpha(1.0);

		// amber ring for the multi-selection, white for the inspector focus
		if node.selected {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(250, 204, 21, 0.9)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}
		if focused == Some(node.id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 6.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.85)");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		if !node.label.is_empty() {
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.85));
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
		}
	}
}
