//! HTTP route handlers for the graph server.
//!
//! Handlers are kept thin, delegating to the core graph queries.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use gnowgraph_core::backends::get_url_shortener;
use gnowgraph_core::{GraphError, GraphJson, Neighbourhood, Nid, RenderedNeighbourhood};

use super::graph::GraphBuilder;
use super::models::{ApiError, GraphData, NodeDetails, SearchQuery, SearchResult};
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, error: impl ToString) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

fn graph_error(err: GraphError) -> (StatusCode, Json<ApiError>) {
    match err {
        GraphError::NotFound(_) => api_error(StatusCode::NOT_FOUND, err),
        GraphError::WrongKind { .. } => api_error(StatusCode::BAD_REQUEST, err),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}

/// GET `/api/graph` - Every node with its relation and membership links.
///
/// Response format:
/// ```json
/// {
///   "nodes": [{"key": "3", "attributes": {...}}],
///   "edges": [{"source": "4", "target": "3", "attributes": {...}}]
/// }
/// ```
pub async fn api_graph(State(state): State<Arc<AppState>>) -> Json<GraphData> {
    let graph = state.graph.read().await;
    Json(GraphBuilder::new().build(&graph))
}

/// GET `/api/node/{id}` - Summary of one node.
pub async fn api_node(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult<NodeDetails> {
    let graph = state.graph.read().await;
    let nid = Nid(id);
    let node = graph.node(nid).map_err(graph_error)?;
    let shortener = get_url_shortener(&state.url_shortener);

    Ok(Json(NodeDetails {
        nid: id,
        title: node.title.clone(),
        node_type: node.kind.type_name().to_string(),
        slug: node.slug().map(str::to_string),
        locator: state.locator.locate_absolute(&graph, nid).ok(),
        short_url: shortener.shorten(&graph, &state.locator, nid).ok(),
        prior_nodes: graph.prior_nodes(nid).into_iter().map(|n| n.0).collect(),
        posterior_nodes: graph.posterior_nodes(nid).into_iter().map(|n| n.0).collect(),
    }))
}

/// GET `/api/node/{id}/nbh` - Neighbourhood with Nids.
pub async fn api_nbh(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult<Neighbourhood> {
    let graph = state.graph.read().await;
    graph.nbh(Nid(id)).map(Json).map_err(graph_error)
}

/// GET `/api/node/{id}/rendered` - Neighbourhood with titles and locators.
pub async fn api_rendered_nbh(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<RenderedNeighbourhood> {
    let graph = state.graph.read().await;
    graph
        .rendered_nbh(Nid(id), &state.locator)
        .map(Json)
        .map_err(graph_error)
}

/// GET `/api/node/{id}/graph` - Graph JSON export of one node.
pub async fn api_graph_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<GraphJson> {
    let graph = state.graph.read().await;
    graph
        .graph_json(Nid(id), &state.locator)
        .map(Json)
        .map_err(|e| match e {
            gnowgraph_core::nbh::GraphJsonError::Graph(inner) => graph_error(inner),
            other => api_error(StatusCode::CONFLICT, other),
        })
}

/// GET `/api/search` - Nodes whose title, slug or alternate names contain
/// the query, case-insensitively.
///
/// Query parameters:
/// - `q`: Search query string (required)
/// - `limit`: Maximum results (default: 20)
pub async fn api_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<SearchResult>> {
    let graph = state.graph.read().await;
    let needle = params.q.to_lowercase();

    let results = graph
        .nodes()
        .filter(|node| {
            node.title.to_lowercase().contains(&needle)
                || node.slug().is_some_and(|s| s.contains(&needle))
                || node.altnames.iter().any(|a| a.to_lowercase().contains(&needle))
        })
        .take(params.limit)
        .map(|node| SearchResult {
            nid: node.nid.0,
            title: node.title.clone(),
            node_type: node.kind.type_name().to_string(),
            slug: node.slug().map(str::to_string),
        })
        .collect();

    Json(results)
}
