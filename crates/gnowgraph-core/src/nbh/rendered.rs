use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{Graph, GraphError, Result};
use crate::locator::Locator;
use crate::ontology::{Nid, NodeClass};

/// Display pair for a referenced vertex. Escaping is left to the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub locator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedRelations {
    pub left: BTreeMap<String, Vec<Link>>,
    pub right: BTreeMap<String, Vec<Link>>,
}

/// Neighbourhood with every referenced vertex resolved to a [`Link`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNeighbourhood {
    pub nid: Nid,
    pub class: NodeClass,
    pub title: String,
    pub altnames: Vec<String>,
    pub plural: Option<String>,
    pub content: Option<String>,
    #[serde(alias = "member_of_metatypes")]
    pub member_of: Vec<Link>,
    pub type_of: Option<Link>,
    pub contains_subtypes: Vec<Link>,
    pub contains_members: Vec<Link>,
    pub prior_nodes: Vec<Link>,
    pub posterior_nodes: Vec<Link>,
    pub authors: Vec<Link>,
    pub siblings: Vec<Link>,
    pub relations: RenderedRelations,
    pub attributes: BTreeMap<String, String>,
    pub attributetypes: Vec<Link>,
    pub left_subjecttype_of: Vec<Link>,
    pub right_subjecttype_of: Vec<Link>,
}

struct Renderer<'a> {
    graph: &'a Graph,
    locator: &'a Locator,
}

impl Renderer<'_> {
    /// Edges are valid relation counterparts and render like nodes.
    fn link(&self, nid: Nid) -> Result<Link> {
        let title = self.graph.title_of(nid).ok_or(GraphError::NotFound(nid))?;
        Ok(Link {
            title: title.to_string(),
            locator: self.locator.locate_absolute(self.graph, nid)?,
        })
    }

    fn links(&self, nids: &[Nid]) -> Result<Vec<Link>> {
        nids.iter().map(|nid| self.link(*nid)).collect()
    }

    fn grouped(&self, groups: &BTreeMap<String, Vec<Nid>>) -> Result<BTreeMap<String, Vec<Link>>> {
        groups
            .iter()
            .map(|(key, nids)| Ok((key.clone(), self.links(nids)?)))
            .collect()
    }
}

impl Graph {
    /// Computes the neighbourhood of a node with references rendered as
    /// `(title, locator)` pairs.
    pub fn rendered_nbh(&self, nid: Nid, locator: &Locator) -> Result<RenderedNeighbourhood> {
        let nbh = self.nbh(nid)?;
        let r = Renderer { graph: self, locator };

        Ok(RenderedNeighbourhood {
            nid,
            class: nbh.class,
            member_of: r.links(&nbh.member_of)?,
            type_of: nbh.type_of.map(|p| r.link(p)).transpose()?,
            contains_subtypes: r.links(&nbh.contains_subtypes)?,
            contains_members: r.links(&nbh.contains_members)?,
            prior_nodes: r.links(&nbh.prior_nodes)?,
            posterior_nodes: r.links(&nbh.posterior_nodes)?,
            authors: nbh
                .authors
                .iter()
                .map(|name| Link {
                    title: name.clone(),
                    locator: locator.absolute(&locator.author(name)),
                })
                .collect(),
            siblings: r.links(&nbh.siblings)?,
            relations: RenderedRelations {
                left: r.grouped(&nbh.relations.left)?,
                right: r.grouped(&nbh.relations.right)?,
            },
            attributetypes: r.links(&nbh.attributetypes)?,
            left_subjecttype_of: r.links(&nbh.left_subjecttype_of)?,
            right_subjecttype_of: r.links(&nbh.right_subjecttype_of)?,
            title: nbh.title,
            altnames: nbh.altnames,
            plural: nbh.plural,
            content: nbh.content,
            attributes: nbh.attributes,
        })
    }
}
