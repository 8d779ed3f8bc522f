//! Short URLs for graph elements.

use tracing::warn;

use super::UnknownBackendError;
use crate::graph::{Graph, Result};
use crate::locator::Locator;
use crate::ontology::Nid;

/// Produces a short URL for a node or edge.
pub trait UrlShortener: Send + Sync {
    fn name(&self) -> &'static str;

    fn shorten(&self, graph: &Graph, locator: &Locator, nid: Nid) -> Result<String>;
}

/// `{protocol}://{domain}/s/{base36 nid}/`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShortener;

impl UrlShortener for DefaultShortener {
    fn name(&self) -> &'static str {
        "default"
    }

    fn shorten(&self, graph: &Graph, locator: &Locator, nid: Nid) -> Result<String> {
        if !graph.contains(nid) {
            return Err(crate::graph::GraphError::NotFound(nid));
        }
        Ok(locator.absolute(&format!("/s/{}/", nid.to_base36())))
    }
}

/// Returns the full absolute locator unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullUrlShortener;

impl UrlShortener for FullUrlShortener {
    fn name(&self) -> &'static str {
        "full"
    }

    fn shorten(&self, graph: &Graph, locator: &Locator, nid: Nid) -> Result<String> {
        locator.locate_absolute(graph, nid)
    }
}

/// Looks up a shortener by name.
pub fn try_url_shortener(name: &str) -> std::result::Result<Box<dyn UrlShortener>, UnknownBackendError> {
    match name {
        "default" => Ok(Box::new(DefaultShortener)),
        "full" => Ok(Box::new(FullUrlShortener)),
        other => Err(UnknownBackendError {
            kind: "url shortener",
            name: other.to_string(),
        }),
    }
}

/// Looks up a shortener by name, falling back to the default one.
pub fn get_url_shortener(name: &str) -> Box<dyn UrlShortener> {
    match try_url_shortener(name) {
        Ok(shortener) => shortener,
        Err(e) => {
            warn!("{}, using default", e);
            Box::new(DefaultShortener)
        }
    }
}

/// Resolves a short-URL token back to a Nid.
pub fn resolve_token(token: &str) -> Option<Nid> {
    u64::from_str_radix(&token.to_ascii_lowercase(), 36)
        .ok()
        .map(Nid)
}
