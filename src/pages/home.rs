//! The canvas workspace page: owns the store instance, wires persistence
//! and composes the canvas, toolbar, inspector and onboarding overlays.

use leptos::prelude::*;

use crate::api::ApiClient;
use crate::canvas::CanvasStore;
use crate::components::canvas::CanvasSurface;
use crate::components::inspector::{Inspector, RelationshipChooser};
use crate::components::onboarding::Onboarding;
use crate::components::storage::{restore_last_session, spawn_autosave};
use crate::components::toolbar::Toolbar;

/// Canvas workspace page.
#[component]
pub fn Home() -> impl IntoView {
	// one store per canvas instance, injected via context rather than a
	// process-wide singleton
	let store = RwSignal::new(CanvasStore::new());
	provide_context(store);
	provide_context(ApiClient::default());

	restore_last_session(store);
	spawn_autosave(store);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="canvas-workspace">
				<CanvasSurface />
				<Toolbar />
				<Inspector />
				<RelationshipChooser />
				<Onboarding />
			</div>
		</ErrorBoundary>
	}
}
