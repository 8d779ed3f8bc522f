//! Stable locators for graph elements.
//!
//! ```text
//! /metatypes/{tree_path}/
//! /nodetypes/{YYYY}/{MM}/{DD}/{slug}/
//! /objects/{YYYY}/{MM}/{DD}/{slug}/
//! /authors/{name}/
//! /edges/{nid}/
//! /nodes/{nid}/
//! ```

use crate::config::SiteConfig;
use crate::graph::{Graph, Result};
use crate::ontology::{Nid, NodeKind, Publication};

/// Builds relative and absolute locators for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    protocol: String,
    domain: String,
}

impl Locator {
    pub fn new(protocol: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            domain: domain.into(),
        }
    }

    pub fn from_site(site: &SiteConfig) -> Self {
        Self::new(&site.protocol, &site.domain)
    }

    /// `{protocol}://{domain}`
    pub fn site_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Prefixes a relative locator with the site URL.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.site_url(), path)
    }

    /// Relative locator of any node or edge.
    pub fn locate(&self, graph: &Graph, nid: Nid) -> Result<String> {
        if graph.get_edge(nid).is_some() {
            return Ok(format!("/edges/{}/", nid));
        }
        let node = graph.node(nid)?;
        match &node.kind {
            NodeKind::Metatype(_) => Ok(format!("/metatypes/{}/", graph.tree_path(nid)?)),
            NodeKind::Nodetype(n) => Ok(dated("nodetypes", &n.publication, &n.slug)),
            NodeKind::Gbobject(g) => Ok(dated("objects", &g.publication, &g.slug)),
            _ => Ok(format!("/nodes/{}/", nid)),
        }
    }

    /// Absolute locator of any node or edge.
    pub fn locate_absolute(&self, graph: &Graph, nid: Nid) -> Result<String> {
        Ok(self.absolute(&self.locate(graph, nid)?))
    }

    pub fn author(&self, name: &str) -> String {
        format!("/authors/{}/", name)
    }

    /// Archive index of published nodetypes.
    pub fn nodetype_index(&self) -> String {
        self.absolute("/nodetypes/")
    }

    /// Latest-nodetypes feed.
    pub fn latest_feed(&self) -> String {
        self.absolute("/feeds/latest/")
    }
}

fn dated(prefix: &str, publication: &Publication, slug: &str) -> String {
    format!(
        "/{}/{}/{}/",
        prefix,
        publication.creation_date.format("%Y/%m/%d"),
        slug
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{Metatype, Nodetype};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_locators() {
        let mut graph = Graph::new();
        let concept = graph.create_metatype("Concept", Metatype::new("concept")).unwrap();
        let event = graph
            .create_metatype("Event", Metatype::new("event").with_parent(concept))
            .unwrap();
        let date = Utc.with_ymd_and_hms(2011, 6, 2, 10, 0, 0).unwrap();
        let car = graph
            .create_nodetype("Car", Nodetype::new("car").with_creation_date(date))
            .unwrap();

        let locator = Locator::new("http", "example.com");
        assert_eq!(locator.locate(&graph, event).unwrap(), "/metatypes/concept/event/");
        assert_eq!(locator.locate(&graph, car).unwrap(), "/nodetypes/2011/06/02/car/");
        assert_eq!(
            locator.locate_absolute(&graph, car).unwrap(),
            "http://example.com/nodetypes/2011/06/02/car/"
        );
        assert_eq!(locator.author("admin"), "/authors/admin/");
    }
}
