//! Async glue between the store and the API client.
//!
//! The store hands back [`FetchPlan`] values from selection/connection
//! transitions; each becomes one `spawn_local` here. Results are committed
//! back through the store's resolve methods, which enforce the staleness
//! discipline, so this module never inspects tickets itself.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::types::{EdgeSuggestionRequest, SynthesisRequest};
use crate::api::ApiClient;
use crate::canvas::{CanvasStore, FetchPlan};

/// Start every fetch in the plan list.
pub fn execute_plans(store: RwSignal<CanvasStore>, api: &ApiClient, plans: Vec<FetchPlan>) {
	for plan in plans {
		let api = api.clone();
		match plan {
			FetchPlan::NodeContext { origin_id } => {
				spawn_local(async move {
					let result = api.node_context(&origin_id).await.map_err(|err| err.to_string());
					store.update(|s| {
						s.resolve_context(&origin_id, result);
					});
				});
			}
			FetchPlan::NodeSuggestions {
				ticket,
				origin_id,
				exclude,
			} => {
				spawn_local(async move {
					let result = api
						.node_suggestions(&origin_id, &exclude)
						.await
						.map(|nodes| nodes.into_iter().map(|n| n.into_suggestion()).collect())
						.map_err(|err| err.to_string());
					store.update(|s| {
						s.resolve_node_suggestions(ticket, result);
					});
				});
			}
			FetchPlan::EdgeTypeSuggestions { ticket, source, target } => {
				spawn_local(async move {
					let request = EdgeSuggestionRequest::for_pair(&source, &target);
					let result = api
						.edge_type_suggestions(&request)
						.await
						.map_err(|err| err.to_string());
					store.update(|s| {
						s.resolve_edge_type_suggestions(ticket, result);
					});
				});
			}
		}
	}
}

/// Resolve the synthesis input, send it and merge the response. Failures
/// land in the store's terminal error state; nothing else changes.
pub fn run_synthesis(store: RwSignal<CanvasStore>, api: &ApiClient) {
	let Some(Ok(selection)) = store.try_update(|s| s.begin_synthesis()) else {
		return;
	};
	let request = SynthesisRequest::from_graph(&selection.nodes, &selection.edges);
	let api = api.clone();
	spawn_local(async move {
		match api.synthesize(&request).await {
			Ok(response) => {
				let plans = store.try_update(|s| s.apply_synthesis(response)).unwrap_or_default();
				execute_plans(store, &api, plans);
			}
			Err(err) => {
				store.update(|s| s.fail_synthesis(err.to_string()));
			}
		}
	});
}
