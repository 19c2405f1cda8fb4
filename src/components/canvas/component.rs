//! The canvas surface: event wiring between pointer gestures and the store,
//! plus the animation-frame render loop.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use crate::api::ApiClient;
use crate::canvas::{
	CanvasStore, EdgeChange, NodeChange, NodeDraft, NodeKind, PendingConnection, Position,
	Selection, Viewport,
};
use crate::components::tasks::execute_plans;

use super::render;
use super::state::CanvasView;

/// Deselect changes for everything currently multi-selected.
fn deselect_all(store: RwSignal<CanvasStore>) {
	let node_changes: Vec<NodeChange> = store.with_untracked(|s| {
		s.nodes()
			.iter()
			.filter(|n| n.selected)
			.map(|n| NodeChange::Select {
				id: n.id.clone(),
				selected: false,
			})
			.collect()
	});
	let edge_changes: Vec<EdgeChange> = store.with_untracked(|s| {
		s.edges()
			.iter()
			.filter(|e| e.selected)
			.map(|e| EdgeChange::Select {
				id: e.id.clone(),
				selected: false,
			})
			.collect()
	});
	store.update(|s| {
		s.apply_node_changes(node_changes);
		s.apply_edge_changes(edge_changes);
	});
}

#[component]
pub fn CanvasSurface() -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let api = expect_context::<ApiClient>();

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let view: Rc<RefCell<Option<CanvasView>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (view_init, animate_init, resize_cb_init) =
		(view.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();
		let (w, h) = (
			window.inner_width().unwrap().as_f64().unwrap(),
			window.inner_height().unwrap().as_f64().unwrap(),
		);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();
		*view_init.borrow_mut() = Some(CanvasView::new(w, h));

		let (view_resize, canvas_resize) = (view_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let win: Window = web_sys::window().unwrap();
			let (nw, nh) = (
				win.inner_width().unwrap().as_f64().unwrap(),
				win.inner_height().unwrap().as_f64().unwrap(),
			);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut v) = *view_resize.borrow_mut() {
				v.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (view_anim, animate_inner) = (view_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut v) = *view_anim.borrow_mut() {
				v.tick(0.016);
				let _ = store.try_with_untracked(|s| render::render(s, v, &ctx));
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let event_point = move |ev: &MouseEvent| -> (f64, f64) {
		let canvas: HtmlCanvasElement = canvas_ref.get_untracked().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		)
	};

	let (view_md, api_md) = (view.clone(), api.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = event_point(&ev);
		let mut guard = view_md.borrow_mut();
		let Some(ref mut v) = *guard else {
			return;
		};

		if let Some(id) = store.with_untracked(|s| v.node_at_position(s, x, y)) {
			if ev.shift_key() || ev.alt_key() {
				// start drawing a connection
				let (gx, gy) = store.with_untracked(|s| v.screen_to_graph(s.viewport(), x, y));
				v.link.active = true;
				v.link.source_id = Some(id);
				v.link.cursor_x = gx;
				v.link.cursor_y = gy;
			} else if ev.ctrl_key() || ev.meta_key() {
				// toggle membership in the multi-selection
				let selected =
					store.with_untracked(|s| s.node(&id).map(|n| n.selected).unwrap_or(false));
				let plans = store
					.try_update(|s| {
						s.apply_node_changes(vec![NodeChange::Select {
							id: id.clone(),
							selected: !selected,
						}])
					})
					.unwrap_or_default();
				execute_plans(store, &api_md, plans);
			} else {
				// exclusive select, then drag
				deselect_all(store);
				let plans = store
					.try_update(|s| {
						s.apply_node_changes(vec![NodeChange::Select {
							id: id.clone(),
							selected: true,
						}])
					})
					.unwrap_or_default();
				execute_plans(store, &api_md, plans);
				v.drag.active = true;
				v.drag.node_id = Some(id.clone());
				v.drag.start_x = x;
				v.drag.start_y = y;
				v.drag.moved = false;
				v.drag.node_start = store
					.with_untracked(|s| s.node(&id).map(|n| n.position))
					.unwrap_or_default();
			}
		} else if let Some(id) = store.with_untracked(|s| v.edge_at_position(s, x, y)) {
			deselect_all(store);
			let plans = store
				.try_update(|s| {
					s.apply_edge_changes(vec![EdgeChange::Select {
						id,
						selected: true,
					}])
				})
				.unwrap_or_default();
			execute_plans(store, &api_md, plans);
		} else {
			let vp = store.with_untracked(|s| s.viewport());
			v.pan.active = true;
			v.pan.moved = false;
			v.pan.start_x = x;
			v.pan.start_y = y;
			v.pan.viewport_start_x = vp.x;
			v.pan.viewport_start_y = vp.y;
		}
	};

	let view_mm = view.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = event_point(&ev);
		let mut guard = view_mm.borrow_mut();
		let Some(ref mut v) = *guard else {
			return;
		};

		if !v.drag.active && !v.pan.active && !v.link.active {
			let hovered = store.with_untracked(|s| v.node_at_position(s, x, y));
			store.with_untracked(|s| v.set_hover(s, hovered));
			return;
		}

		if v.drag.active {
			if let Some(id) = v.drag.node_id.clone() {
				let zoom = store.with_untracked(|s| s.viewport().zoom);
				let (dx, dy) = ((x - v.drag.start_x) / zoom, (y - v.drag.start_y) / zoom);
				if dx.abs() > 0.5 || dy.abs() > 0.5 {
					v.drag.moved = true;
				}
				let position = v.drag.node_start.offset(dx, dy);
				store.update(|s| {
					s.apply_node_changes(vec![NodeChange::Position { id, position }]);
				});
			}
		} else if v.link.active {
			let (gx, gy) = store.with_untracked(|s| v.screen_to_graph(s.viewport(), x, y));
			v.link.cursor_x = gx;
			v.link.cursor_y = gy;
		} else if v.pan.active {
			v.pan.moved = true;
			let (vx, vy) = (
				v.pan.viewport_start_x + (x - v.pan.start_x),
				v.pan.viewport_start_y + (y - v.pan.start_y),
			);
			store.update(|s| {
				let zoom = s.viewport().zoom;
				s.set_viewport(Viewport {
					x: vx,
					y: vy,
					zoom,
				});
			});
		}
	};

	let (view_mu, api_mu) = (view.clone(), api.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let (x, y) = event_point(&ev);
		let mut guard = view_mu.borrow_mut();
		let Some(ref mut v) = *guard else {
			return;
		};

		if v.link.active {
			let source = v.link.source_id.take();
			v.link.active = false;
			let target = store.with_untracked(|s| v.node_at_position(s, x, y));
			if let (Some(source), Some(target)) = (source, target) {
				let plans = store
					.try_update(|s| {
						s.set_pending_connection(Some(PendingConnection::new(source, target)))
					})
					.unwrap_or_default();
				execute_plans(store, &api_mu, plans);
			}
		}

		if v.drag.active {
			v.drag.active = false;
			v.drag.node_id = None;
		}

		if v.pan.active {
			if !v.pan.moved {
				// background click: drop focus, multi-selection and chooser
				store.update(|s| {
					s.clear_selection();
					s.close_relationship_selector();
				});
				deselect_all(store);
			}
			v.pan.active = false;
		}
	};

	let view_ml = view.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut v) = *view_ml.borrow_mut() {
			v.drag.active = false;
			v.drag.node_id = None;
			v.pan.active = false;
			v.link.active = false;
			v.link.source_id = None;
			store.with_untracked(|s| v.set_hover(s, None));
		}
	};

	let (view_dc, api_dc) = (view.clone(), api.clone());
	let on_dblclick = move |ev: MouseEvent| {
		let (x, y) = event_point(&ev);
		let guard = view_dc.borrow();
		let Some(ref v) = *guard else {
			return;
		};
		if store.with_untracked(|s| v.node_at_position(s, x, y)).is_some() {
			return;
		}
		let (gx, gy) = store.with_untracked(|s| v.screen_to_graph(s.viewport(), x, y));
		let node = store.try_update(|s| {
			s.add_node(
				NodeKind::Concept,
				Position::new(gx, gy),
				NodeDraft {
					created_at: Some(js_sys::Date::now()),
					..NodeDraft::default()
				},
			)
		});
		if let Some(node) = node {
			let plans = store.try_update(|s| s.select_node(&node.id)).unwrap_or_default();
			execute_plans(store, &api_dc, plans);
		}
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let (x, y) = event_point(&ev);
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		store.update(|s| {
			let vp = s.viewport();
			let new_k = (vp.zoom * factor).clamp(0.1, 10.0);
			let ratio = new_k / vp.zoom;
			s.set_viewport(Viewport {
				x: x - (x - vp.x) * ratio,
				y: y - (y - vp.y) * ratio,
				zoom: new_k,
			});
		});
	};

	// Escape cancels the chooser and focus; Delete removes the focused
	// node or edge (unless the user is typing in a form field).
	let handle = window_event_listener(leptos::ev::keydown, move |ev| {
		let typing = ev
			.target()
			.and_then(|t| t.dyn_into::<web_sys::Element>().ok())
			.map(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
			.unwrap_or(false);
		if typing {
			return;
		}
		match ev.key().as_str() {
			"Escape" => {
				store.update(|s| {
					s.close_relationship_selector();
					s.clear_selection();
				});
				deselect_all(store);
			}
			"Delete" | "Backspace" => {
				let selection = store.with_untracked(|s| s.selection().clone());
				match selection {
					Selection::Node(id) => {
						store.update(|s| {
							s.apply_node_changes(vec![NodeChange::Remove { id }]);
						});
					}
					Selection::Edge(id) => {
						store.update(|s| {
							s.apply_edge_changes(vec![EdgeChange::Remove { id }]);
						});
					}
					Selection::None => {}
				}
			}
			_ => {}
		}
	});
	on_cleanup(move || handle.remove());

	view! {
		<canvas
			node_ref=canvas_ref
			class="knowledge-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
