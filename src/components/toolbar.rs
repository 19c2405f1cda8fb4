//! Toolbar: concept search, random concept, synthesis trigger and canvas
//! reset.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::types::WireNode;
use crate::api::ApiClient;
use crate::canvas::types::Provenance;
use crate::canvas::{CanvasStore, Position};
use crate::components::tasks::{execute_plans, run_synthesis};

/// Graph-space point currently at the middle of the screen, nudged so
/// consecutive placements fan out instead of stacking.
fn placement_point(store: &CanvasStore) -> Position {
	let viewport = store.viewport();
	let (w, h) = web_sys::window()
		.and_then(|win| {
			let w = win.inner_width().ok()?.as_f64()?;
			let h = win.inner_height().ok()?.as_f64()?;
			Some((w, h))
		})
		.unwrap_or((1280.0, 720.0));
	let spread = store.nodes().len() as f64;
	Position::new(
		(w / 2.0 - viewport.x) / viewport.zoom + 34.0 * (spread % 4.0) - 51.0,
		(h / 2.0 - viewport.y) / viewport.zoom + 28.0 * (spread % 5.0) - 56.0,
	)
}

#[component]
pub fn Toolbar() -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let api = StoredValue::new(expect_context::<ApiClient>());

	let (query, set_query) = signal(String::new());
	let (results, set_results) = signal(Vec::<WireNode>::new());
	let (searching, set_searching) = signal(false);
	let (search_failed, set_search_failed) = signal(false);

	let run_search = move || {
		let q = query.get_untracked().trim().to_string();
		if q.is_empty() {
			return;
		}
		set_searching.set(true);
		set_search_failed.set(false);
		let api = api.get_value();
		spawn_local(async move {
			match api.search_concepts(&q, 12).await {
				Ok(hits) => set_results.set(hits),
				Err(err) => {
					log::warn!("concept search failed: {err}");
					set_results.set(Vec::new());
					set_search_failed.set(true);
				}
			}
			set_searching.set(false);
		});
	};

	let place_wire_node = move |wire: WireNode| {
		let position = store.with_untracked(placement_point);
		let mut node = wire.into_node(position, Provenance::Search);
		// wire positions come from another canvas life; place at the viewport
		node.position = position;
		let id = node.id.clone();
		store.update(|s| {
			s.add_nodes_bulk(vec![node]);
		});
		let plans = store.try_update(|s| s.select_node(&id)).unwrap_or_default();
		api.with_value(|api| execute_plans(store, api, plans));
	};

	let pick_result = move |wire: WireNode| {
		set_results.set(Vec::new());
		set_query.set(String::new());
		place_wire_node(wire);
	};

	let random = move |_| {
		let api_client = api.get_value();
		spawn_local(async move {
			match api_client.random_concept().await {
				Ok(Some(wire)) => place_wire_node(wire),
				Ok(None) => log::info!("the knowledge base has no concept to offer"),
				Err(err) => log::warn!("random concept failed: {err}"),
			}
		});
	};

	let synthesize = move |_| {
		api.with_value(|api| run_synthesis(store, api));
	};

	let can_synthesize =
		move || store.with(|s| !s.synthesis_loading() && s.resolve_synthesis_input().is_some());

	view! {
		<div class="toolbar">
			<h1>"Knowledge Canvas"</h1>
			<div class="search">
				<input
					placeholder="Search concepts…"
					prop:value=query
					on:input=move |ev| set_query.set(event_target_value(&ev))
					on:keydown=move |ev| {
						if ev.key() == "Enter" {
							run_search();
						}
					}
				/>
				<button on:click=move |_| run_search()>
					{move || if searching.get() { "…" } else { "Search" }}
				</button>
				<Show when=move || search_failed.get()>
					<p class="hint error">"Search failed — is the backend up?"</p>
				</Show>
				<Show when=move || !results.get().is_empty()>
					<ul class="search-results">
						{move || {
							results
								.get()
								.into_iter()
								.map(|wire| {
									let label = if wire.label.is_empty() {
										"(unnamed)".to_string()
									} else {
										wire.label.clone()
									};
									view! {
										<li on:click=move |_| pick_result(wire.clone())>{label}</li>
									}
								})
								.collect_view()
						}}
					</ul>
				</Show>
			</div>
			<button on:click=random>"Surprise me"</button>
			<button
				class="synthesize"
				prop:disabled=move || !can_synthesize()
				on:click=synthesize
			>
				{move || {
					if store.with(|s| s.synthesis_loading()) {
						"Synthesizing…"
					} else {
						"Synthesize"
					}
				}}
			</button>
			{move || {
				store
					.with(|s| s.synthesis_error().map(str::to_string))
					.map(|err| view! { <p class="hint error">"Synthesis failed: " {err}</p> })
			}}
			<button class="danger" on:click=move |_| store.update(|s| s.reset())>
				"Reset canvas"
			</button>
		</div>
	}
}
