//! Local read-only web server over a graph snapshot.
//!
//! Serves the whole graph in the shape Sigma.js/Graphology clients expect,
//! plus per-node neighbourhoods and graph JSON exports.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)
//! - `graph` - Graph building logic

mod graph;
mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use gnowgraph_core::{Graph, Locator};

/// State shared by all handlers. The graph is a read-only copy of the
/// snapshot loaded at startup.
pub struct AppState {
    pub graph: Arc<RwLock<Graph>>,
    /// Builds absolute locators in responses.
    pub locator: Locator,
    /// Name of the URL shortener backend.
    pub url_shortener: String,
}

/// What `gnow serve` listens on and how it renders links.
pub struct ServeConfig {
    pub port: u16,
    pub locator: Locator,
    pub url_shortener: String,
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/graph", get(handlers::api_graph))
        .route("/api/node/{id}", get(handlers::api_node))
        .route("/api/node/{id}/nbh", get(handlers::api_nbh))
        .route("/api/node/{id}/rendered", get(handlers::api_rendered_nbh))
        .route("/api/node/{id}/graph", get(handlers::api_graph_json))
        .route("/api/search", get(handlers::api_search))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Serve `graph` until the process is stopped.
pub async fn start_server(graph: Graph, config: ServeConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState {
        graph: Arc::new(RwLock::new(graph)),
        locator: config.locator,
        url_shortener: config.url_shortener,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!(%addr, "starting graph server");
    println!("Serving graph at http://localhost:{}/api/graph", config.port);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await
}
