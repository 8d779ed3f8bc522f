//! JSON bodies exchanged with the graph browser.

use serde::{Deserialize, Serialize};

/// Body of `/api/graph`: Graphology's serialized node and edge lists.
#[derive(Debug, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Serialize)]
pub struct GraphNode {
    /// Nid as a string key.
    pub key: String,
    pub attributes: NodeAttributes,
}

#[derive(Debug, Serialize)]
pub struct NodeAttributes {
    pub label: String,
    /// Two-letter node class code ("MT", "OT", "RT", ...).
    pub category: String,
    pub color: String,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<EdgeAttributes>,
}

#[derive(Debug, Serialize)]
pub struct EdgeAttributes {
    /// Relationtype title, or "member_of" / "subtype_of".
    /// Sigma reserves "type" for the edge renderer.
    pub relationship: String,
}

/// Body of `/api/node/{id}`.
#[derive(Debug, Serialize)]
pub struct NodeDetails {
    pub nid: u64,
    pub title: String,
    pub node_type: String,
    pub slug: Option<String>,
    pub locator: Option<String>,
    pub short_url: Option<String>,
    pub prior_nodes: Vec<u64>,
    pub posterior_nodes: Vec<u64>,
}

/// `?q=...&limit=...` on `/api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub nid: u64,
    pub title: String,
    pub node_type: String,
    pub slug: Option<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}
