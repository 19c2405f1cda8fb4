//! Onboarding overlay: pick an archetype, seed the canvas with its
//! concepts. Shown only while the canvas is empty.

use std::f64::consts::PI;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::ApiClient;
use crate::canvas::types::Provenance;
use crate::canvas::{CanvasStore, Position};

const SEED_RING_RADIUS: f64 = 180.0;

const ARCHETYPES: &[(&str, &str, &str)] = &[
	("alchemist", "The Alchemist", "Transformation, essence, catalysis."),
	("weaver", "The Weaver", "Connections, patterns, narratives."),
	("trickster", "The Trickster", "Paradox, illusion, disruption."),
	("explorer", "The Explorer", "Frontiers, discovery, boundaries."),
	("sage", "The Sage", "Wisdom, tradition, insight."),
	("synthesist", "The Synthesist", "Harmony, integration, emergence."),
];

#[component]
pub fn Onboarding() -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let api = StoredValue::new(expect_context::<ApiClient>());

	let (dismissed, set_dismissed) = signal(false);
	let (busy, set_busy) = signal(false);
	let (failed, set_failed) = signal(false);

	let visible = move || !dismissed.get() && store.with(|s| s.is_empty());

	let choose = move |archetype_id: &'static str| {
		if busy.get_untracked() {
			return;
		}
		set_busy.set(true);
		set_failed.set(false);
		let api_client = api.get_value();
		spawn_local(async move {
			match api_client.select_archetype(archetype_id).await {
				Ok(seeds) => {
					let count = seeds.len().max(1) as f64;
					let nodes = seeds
						.into_iter()
						.enumerate()
						.map(|(i, wire)| {
							// ring layout around the origin; seed payloads
							// ship placeholder positions we ignore
							let angle = (i as f64) * 2.0 * PI / count;
							let ring = Position::new(
								SEED_RING_RADIUS * angle.cos(),
								SEED_RING_RADIUS * angle.sin(),
							);
							let mut node = wire.into_node(ring, Provenance::Seed);
							node.position = ring;
							node
						})
						.collect();
					store.update(|s| {
						s.add_nodes_bulk(nodes);
					});
					set_dismissed.set(true);
				}
				Err(err) => {
					log::warn!("archetype selection failed: {err}");
					set_failed.set(true);
				}
			}
			set_busy.set(false);
		});
	};

	view! {
		<Show when=visible>
			<div class="onboarding">
				<div class="onboarding-card">
					<h2>"Who are you today?"</h2>
					<p class="subtitle">"Your archetype seeds the canvas with its first concepts."</p>
					<Show when=move || failed.get()>
						<p class="hint error">"Could not load seed concepts. Try again."</p>
					</Show>
					<div class="archetypes">
						{ARCHETYPES
							.iter()
							.map(|(id, name, blurb)| {
								let id = *id;
								view! {
									<button
										class="archetype"
										prop:disabled=move || busy.get()
										on:click=move |_| choose(id)
									>
										<strong>{*name}</strong>
										<span>{*blurb}</span>
									</button>
								}
							})
							.collect_view()}
					</div>
					<button class="skip" on:click=move |_| set_dismissed.set(true)>
						"Start with a blank canvas"
					</button>
				</div>
			</div>
		</Show>
	}
}
