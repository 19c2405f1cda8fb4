//! Typed async client for the knowledge-canvas backend.
//!
//! Thin I/O wrapper: every operation is one bounded-timeout fetch returning
//! either the decoded wire type or an [`ApiError`]. No retries; retry is a
//! user-initiated re-click.

pub mod types;

use std::pin::pin;

use futures_util::future::{select, Either};
use gloo_net::http::{Request, Response};
use gloo_timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::canvas::suggestions::NodeContext;
use crate::canvas::types::SemanticType;

use types::{
	ArchetypeSelectionRequest, EdgeSuggestionRequest, EdgeTypeSuggestionsWire,
	SeedConceptsResponse, SynthesisRequest, SynthesisResponse, WireNode,
};

/// Bound on every network call; a request outliving this fails like any
/// other network error.
pub const REQUEST_TIMEOUT_MS: u32 = 20_000;

/// Failure taxonomy for backend calls.
#[derive(Clone, Debug, Error)]
pub enum ApiError {
	#[error("network error: {0}")]
	Network(String),
	#[error("request timed out")]
	Timeout,
	#[error("server responded with status {0}")]
	Status(u16),
	#[error("malformed response: {0}")]
	Decode(String),
}

/// Handle to the backend, cloneable and injected via context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiClient {
	base: String,
}

impl ApiClient {
	/// `base` is prepended to every path; the default client talks to the
	/// serving origin.
	pub fn new(base: impl Into<String>) -> ApiClient {
		ApiClient { base: base.into() }
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base, path)
	}

	/// GET `/concepts/search?query=&limit=`.
	pub async fn search_concepts(&self, query: &str, limit: u32) -> Result<Vec<WireNode>, ApiError> {
		let limit = limit.to_string();
		let request = Request::get(&self.url("/concepts/search"))
			.query([("query", query), ("limit", limit.as_str())]);
		let response = with_timeout(request.send()).await?;
		expect_json(response).await
	}

	/// GET `/concepts/random`; a 404 is the distinguished empty case.
	pub async fn random_concept(&self) -> Result<Option<WireNode>, ApiError> {
		let response = with_timeout(Request::get(&self.url("/concepts/random")).send()).await?;
		if response.status() == 404 {
			return Ok(None);
		}
		expect_json(response).await.map(Some)
	}

	/// GET `/concepts/{originId}/context`.
	pub async fn node_context(&self, origin_id: &str) -> Result<NodeContext, ApiError> {
		let path = format!("/concepts/{origin_id}/context");
		let response = with_timeout(Request::get(&self.url(&path)).send()).await?;
		expect_json(response).await
	}

	/// GET `/suggestions/nodes/{originId}`, excluding on-canvas concepts.
	pub async fn node_suggestions(
		&self,
		origin_id: &str,
		exclude: &[String],
	) -> Result<Vec<WireNode>, ApiError> {
		let path = format!("/suggestions/nodes/{origin_id}");
		let request = Request::get(&self.url(&path))
			.query(exclude.iter().map(|id| ("exclude", id.as_str())));
		let response = with_timeout(request.send()).await?;
		expect_json(response).await
	}

	/// POST `/suggestions/edges` for a node pair.
	pub async fn edge_type_suggestions(
		&self,
		request: &EdgeSuggestionRequest,
	) -> Result<Vec<SemanticType>, ApiError> {
		let request = Request::post(&self.url("/suggestions/edges"))
			.json(request)
			.map_err(|err| ApiError::Network(err.to_string()))?;
		let response = with_timeout(request.send()).await?;
		let wire: EdgeTypeSuggestionsWire = expect_json(response).await?;
		Ok(wire.into_types())
	}

	/// POST `/onboarding/select-archetype`, returning the seed concepts.
	pub async fn select_archetype(&self, archetype_id: &str) -> Result<Vec<WireNode>, ApiError> {
		let body = ArchetypeSelectionRequest {
			archetype_id: archetype_id.to_string(),
		};
		let request = Request::post(&self.url("/onboarding/select-archetype"))
			.json(&body)
			.map_err(|err| ApiError::Network(err.to_string()))?;
		let response = with_timeout(request.send()).await?;
		let wire: SeedConceptsResponse = expect_json(response).await?;
		Ok(wire.seed_concepts)
	}

	/// POST `/synthesis/` with the resolved subgraph.
	pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResponse, ApiError> {
		let request = Request::post(&self.url("/synthesis/"))
			.json(request)
			.map_err(|err| ApiError::Network(err.to_string()))?;
		let response = with_timeout(request.send()).await?;
		expect_json(response).await
	}
}

async fn with_timeout<F>(fut: F) -> Result<Response, ApiError>
where
	F: Future<Output = Result<Response, gloo_net::Error>>,
{
	let fut = pin!(fut);
	let timeout = pin!(TimeoutFuture::new(REQUEST_TIMEOUT_MS));
	match select(fut, timeout).await {
		Either::Left((result, _)) => result.map_err(|err| ApiError::Network(err.to_string())),
		Either::Right(_) => Err(ApiError::Timeout),
	}
}

async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
	if !response.ok() {
		return Err(ApiError::Status(response.status()));
	}
	response
		.json::<T>()
		.await
		.map_err(|err| ApiError::Decode(err.to_string()))
}
