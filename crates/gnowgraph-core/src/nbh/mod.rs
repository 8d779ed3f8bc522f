//! Neighbourhood computation.
//!
//! A neighbourhood is the local graph context of one vertex: its own labels,
//! what it is a member of, what it contains, its dependencies, authorship,
//! siblings, relations and attributes. Every collection is always present,
//! empty when there is nothing to report.

mod graph_json;
mod rendered;

pub use graph_json::{GraphJson, GraphJsonError, GraphLink, NodeMetadata};
pub use rendered::{Link, RenderedNeighbourhood, RenderedRelations};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{Graph, RelationsOf, Result};
use crate::ontology::{Nid, NodeClass, NodeKind};

/// Raw neighbourhood of a vertex, holding Nids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbourhood {
    pub nid: Nid,
    pub class: NodeClass,
    pub title: String,
    pub altnames: Vec<String>,
    pub plural: Option<String>,
    /// Body text, for publishable vertices.
    pub content: Option<String>,
    /// Metatypes of a Nodetype, Objecttypes of a Gbobject.
    #[serde(alias = "member_of_metatypes")]
    pub member_of: Vec<Nid>,
    /// Immediate parent.
    pub type_of: Option<Nid>,
    pub contains_subtypes: Vec<Nid>,
    /// Vertices that name this one as their type.
    pub contains_members: Vec<Nid>,
    pub prior_nodes: Vec<Nid>,
    pub posterior_nodes: Vec<Nid>,
    pub authors: Vec<String>,
    pub siblings: Vec<Nid>,
    /// Keyed like [`Graph::relations_of`], but the values are the subjects
    /// on the other side of each relation.
    pub relations: RelationsOf,
    pub attributes: BTreeMap<String, String>,
    pub attributetypes: Vec<Nid>,
    pub left_subjecttype_of: Vec<Nid>,
    pub right_subjecttype_of: Vec<Nid>,
}

impl Graph {
    /// Computes the neighbourhood of a node.
    pub fn nbh(&self, nid: Nid) -> Result<Neighbourhood> {
        let node = self.node(nid)?;

        let (content, member_of, authors) = match &node.kind {
            NodeKind::Nodetype(n) => (Some(n.content.clone()), n.metatypes.clone(), n.authors.clone()),
            NodeKind::Gbobject(g) => (Some(g.content.clone()), g.objecttypes.clone(), g.authors.clone()),
            _ => (None, Vec::new(), Vec::new()),
        };

        let contains_members = match &node.kind {
            NodeKind::Metatype(_) => self
                .nodes()
                .filter(|n| n.as_nodetype().is_some_and(|t| t.metatypes.contains(&nid)))
                .map(|n| n.nid)
                .collect(),
            NodeKind::Nodetype(_) => self
                .nodes()
                .filter(|n| n.as_gbobject().is_some_and(|g| g.objecttypes.contains(&nid)))
                .map(|n| n.nid)
                .collect(),
            _ => Vec::new(),
        };

        Ok(Neighbourhood {
            nid,
            class: node.class(),
            title: node.title.clone(),
            altnames: node.altnames.clone(),
            plural: node.plural.clone(),
            content,
            member_of,
            type_of: node.parent(),
            contains_subtypes: self.children(nid),
            contains_members,
            prior_nodes: self.prior_nodes(nid),
            posterior_nodes: self.posterior_nodes(nid),
            authors,
            siblings: self.siblings(nid)?,
            relations: self.relation_counterparts(nid),
            attributes: self.attributes_of(nid),
            attributetypes: self.attributetypes_of(nid),
            left_subjecttype_of: self.left_subjecttype_of(nid),
            right_subjecttype_of: self.right_subjecttype_of(nid),
        })
    }

    /// Relations of `subject` with each edge replaced by the subject on the
    /// other side.
    fn relation_counterparts(&self, subject: Nid) -> RelationsOf {
        let counterpart = |edge: &Nid, left_side: bool| {
            self.get_edge(*edge)
                .and_then(|e| e.as_relation())
                .map(|r| if left_side { r.right_subject } else { r.left_subject })
        };
        let found = self.relations_of(subject);
        RelationsOf {
            left: found
                .left
                .iter()
                .map(|(k, edges)| (k.clone(), edges.iter().filter_map(|e| counterpart(e, true)).collect()))
                .collect(),
            right: found
                .right
                .iter()
                .map(|(k, edges)| (k.clone(), edges.iter().filter_map(|e| counterpart(e, false)).collect()))
                .collect(),
        }
    }
}
