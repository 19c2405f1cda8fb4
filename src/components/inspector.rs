//! Inspector side panel and the relationship chooser.
//!
//! Pure view over the store: which panel shows is a function of the focus
//! state, the chooser is a function of the pending connection, and every
//! action routes back through store operations.

use leptos::prelude::*;

use crate::api::ApiClient;
use crate::canvas::suggestions::{ContextEntry, SuggestedConcept};
use crate::canvas::types::Provenance;
use crate::canvas::{
	CanvasStore, Edge, EdgeChange, Node, NodeChange, NodeDraft, NodeKind, Selection, SemanticType,
	SEMANTIC_CATALOGUE,
};
use crate::components::tasks::execute_plans;

fn focused_node(store: RwSignal<CanvasStore>) -> Option<Node> {
	store.with(|s| match s.selection() {
		Selection::Node(id) => s.node(id).cloned(),
		_ => None,
	})
}

fn focused_edge(store: RwSignal<CanvasStore>) -> Option<Edge> {
	store.with(|s| match s.selection() {
		Selection::Edge(id) => s.edge(id).cloned(),
		_ => None,
	})
}

/// Relationship chooser shown while a connection awaits its semantic type.
#[component]
pub fn RelationshipChooser() -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();

	let pick = move |semantic_type: SemanticType| {
		store.update(|s| {
			s.confirm_relationship_selection(semantic_type);
		});
	};

	let suggested = move || store.with(|s| s.edge_type_suggestions().items().to_vec());
	let fetching = move || store.with(|s| s.edge_type_suggestions().is_fetching());

	view! {
		<Show when=move || store.with(|s| s.pending_connection().is_some())>
			<div class="relationship-chooser">
				<h3>"How do these relate?"</h3>
				<Show when=fetching>
					<p class="hint">"Looking for fitting relations…"</p>
				</Show>
				<div class="suggested-types">
					{move || {
						suggested()
							.into_iter()
							.map(|t| {
								view! {
									<button class="type-chip suggested" on:click=move |_| pick(t)>
										{t.label()}
									</button>
								}
							})
							.collect_view()
					}}
				</div>
				<details>
					<summary>"All relations"</summary>
					<div class="all-types">
						{SEMANTIC_CATALOGUE
							.iter()
							.map(|t| {
								let t = *t;
								view! {
									<button class="type-chip" on:click=move |_| pick(t)>
										{t.label()}
									</button>
								}
							})
							.collect_view()}
					</div>
				</details>
				<button
					class="cancel"
					on:click=move |_| store.update(|s| s.close_relationship_selector())
				>
					"Cancel"
				</button>
			</div>
		</Show>
	}
}

#[component]
fn ContextSection(origin_id: String) -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let origin = StoredValue::new(origin_id);

	let entry = move || store.with(|s| origin.with_value(|o| s.context_for(o).cloned()));

	view! {
		<section class="context">
			<h4>"Context"</h4>
			{move || match entry() {
				None | Some(ContextEntry::Loading) => {
					view! { <p class="hint">"Loading context…"</p> }.into_any()
				}
				Some(ContextEntry::Failed(_)) => {
					view! { <p class="hint error">"Context unavailable."</p> }.into_any()
				}
				Some(ContextEntry::Ready(context)) => {
					let summary = context.summary.clone().filter(|s| !s.is_empty());
					let related = context.related_nodes.clone();
					view! {
						{summary.map(|s| view! { <p>{s}</p> })}
						<ul class="related">
							{related
								.iter()
								.map(|r| {
									let line = match &r.relationship {
										Some(rel) => format!("{} — {}", r.label, rel),
										None => r.label.clone(),
									};
									view! { <li>{line}</li> }
								})
								.collect_view()}
						</ul>
					}
					.into_any()
				}
			}}
		</section>
	}
}

#[component]
fn SuggestionSection() -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let api = StoredValue::new(expect_context::<ApiClient>());

	let place = move |suggestion: SuggestedConcept| {
		let Some(anchor) = focused_node(store) else {
			return;
		};
		let node = store.try_update(|s| {
			let spread = s.nodes().len() as f64;
			s.add_node(
				suggestion.kind,
				anchor.position.offset(140.0, 40.0 * (spread % 5.0) - 80.0),
				NodeDraft {
					label: Some(suggestion.label.clone()),
					description: Some(suggestion.description.clone()),
					origin_id: suggestion.origin_id.clone(),
					created_at: Some(js_sys::Date::now()),
					source: Some(Provenance::Suggestion),
					..NodeDraft::default()
				},
			)
		});
		if let Some(node) = node {
			let plans = store.try_update(|s| s.select_node(&node.id)).unwrap_or_default();
			api.with_value(|api| execute_plans(store, api, plans));
		}
	};

	let fetching = move || store.with(|s| s.node_suggestions().is_fetching());
	let failed = move || store.with(|s| s.node_suggestions().error().is_some());
	let items = move || store.with(|s| s.node_suggestions().items().to_vec());

	view! {
		<section class="suggestions">
			<h4>"Related concepts"</h4>
			<Show when=fetching>
				<p class="hint">"Searching the knowledge base…"</p>
			</Show>
			<Show when=failed>
				<p class="hint error">"Suggestions unavailable."</p>
			</Show>
			<ul>
				{move || {
					items()
						.into_iter()
						.map(|suggestion| {
							let label = suggestion.label.clone();
							let kind = suggestion.kind.display_name();
							view! {
								<li>
									<span>{label} " · " {kind}</span>
									<button on:click=move |_| place(suggestion.clone())>"Add"</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</section>
	}
}

#[component]
fn NodePanel(node: Node) -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let api = StoredValue::new(expect_context::<ApiClient>());
	let node_id = StoredValue::new(node.id.clone());

	let rename = move |ev: web_sys::Event| {
		let label = event_target_value(&ev);
		if label.trim().is_empty() {
			return;
		}
		node_id.with_value(|id| {
			store.update(|s| {
				s.update_node_data(
					id,
					NodeDraft {
						label: Some(label.clone()),
						..NodeDraft::default()
					},
				)
			});
		});
	};

	let delete = move |_| {
		node_id.with_value(|id| {
			store.update(|s| {
				s.apply_node_changes(vec![NodeChange::Remove { id: id.clone() }]);
			});
		});
	};

	let fork = move |_| {
		let forked = node_id.with_value(|id| store.try_update(|s| s.fork_synthesis_node(id)));
		if let Some(Some(new_root)) = forked {
			let plans = store.try_update(|s| s.select_node(&new_root)).unwrap_or_default();
			api.with_value(|api| execute_plans(store, api, plans));
		}
	};

	let kind = node.kind;
	let origin_id = node.origin_id.clone();
	let description = node.description.clone();
	let synthesis_output = node.synthesis_output.clone();
	let lineage_report = node.lineage_report.clone();

	view! {
		<div class="panel-body">
			<span class="kind-badge" style:background=kind.default_color()>
				{kind.display_name()}
			</span>
			<input class="label-edit" prop:value=node.label.clone() on:change=rename />
			{(!description.is_empty()).then(|| view! { <p class="description">{description.clone()}</p> })}

			{origin_id.clone().map(|origin| view! { <ContextSection origin_id=origin /> })}
			{origin_id.as_ref().map(|_| view! { <SuggestionSection /> })}

			{synthesis_output.map(|output| {
				view! {
					<section class="synthesis-report">
						<h4>"Synthesis"</h4>
						<p>{output.description}</p>
					</section>
				}
			})}
			{lineage_report.map(|report| {
				view! {
					<section class="lineage-report">
						<h4>"Lineage"</h4>
						<ul>
							{report
								.direct_parents
								.iter()
								.chain(report.key_influencers.iter())
								.map(|item| view! { <li>{item.name.clone()}</li> })
								.collect_view()}
						</ul>
					</section>
				}
			})}

			<div class="panel-actions">
				<Show when=move || kind == NodeKind::Synthesis>
					<button on:click=fork>"Fork"</button>
				</Show>
				<button class="danger" on:click=delete>"Delete"</button>
			</div>
		</div>
	}
}

#[component]
fn EdgePanel(edge: Edge) -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();
	let edge_id = StoredValue::new(edge.id.clone());

	let endpoints = store.with_untracked(|s| {
		let source = s.node(&edge.source).map(|n| n.label.clone()).unwrap_or_default();
		let target = s.node(&edge.target).map(|n| n.label.clone()).unwrap_or_default();
		(source, target)
	});
	let label = edge.label().unwrap_or("unclassified");
	let lineage = edge.lineage;

	let delete = move |_| {
		edge_id.with_value(|id| {
			store.update(|s| {
				s.apply_edge_changes(vec![EdgeChange::Remove { id: id.clone() }]);
			});
		});
	};

	let suggested = move || store.with(|s| s.edge_type_suggestions().items().to_vec());

	view! {
		<div class="panel-body">
			<p class="edge-summary">
				<strong>{endpoints.0}</strong>
				" "
				<em>{label}</em>
				" "
				<strong>{endpoints.1}</strong>
			</p>
			{lineage.then(|| view! { <p class="hint">"Part of a synthesis lineage."</p> })}
			<section class="suggestions">
				<h4>"Plausible relations"</h4>
				<ul>
					{move || {
						suggested()
							.into_iter()
							.map(|t| view! { <li>{t.label()}</li> })
							.collect_view()
					}}
				</ul>
			</section>
			<div class="panel-actions">
				<button class="danger" on:click=delete>"Delete"</button>
			</div>
		</div>
	}
}

/// The side panel; visibility is derived from the focus state.
#[component]
pub fn Inspector() -> impl IntoView {
	let store = expect_context::<RwSignal<CanvasStore>>();

	view! {
		<Show when=move || store.with(|s| s.inspector_open())>
			<aside class="inspector">
				<button class="close" on:click=move |_| store.update(|s| s.clear_selection())>
					"×"
				</button>
				{move || match (focused_node(store), focused_edge(store)) {
					(Some(node), _) => view! { <NodePanel node=node /> }.into_any(),
					(_, Some(edge)) => view! { <EdgePanel edge=edge /> }.into_any(),
					_ => view! { <p class="hint">"Nothing selected."</p> }.into_any(),
				}}
			</aside>
		</Show>
	}
}
