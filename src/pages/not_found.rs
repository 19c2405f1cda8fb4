use leptos::prelude::*;

/// 404 fallback page.
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"404"</h1>
			<p>"This page does not exist. The canvas lives at the root."</p>
			<a href="/">"Back to the canvas"</a>
		</div>
	}
}
