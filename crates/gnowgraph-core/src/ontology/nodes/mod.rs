//! Node (vertex) types for the ontology graph.
//!
//! Nodes are organized by role:
//!
//! - **Metatype**: category node in a strict tree
//! - **Nodetype**: the publishable unit, specialized into Objecttype,
//!   Relationtype, Attributetype, Processtype and Systemtype
//! - **Gbobject**: object-level instance, member of Objecttypes
//! - **Specifications**: "the X of {subjects}" descriptive records and the
//!   Union / Complement / Intersection groupings

mod gbobject;
mod metatype;
mod nodetype;
mod specification;

pub use gbobject::*;
pub use metatype::*;
pub use nodetype::*;
pub use specification::*;

use serde::{Deserialize, Serialize};

use super::{Nid, NodeClass};

// =============================================================================
// RATING
// =============================================================================

/// Numeric rating between 0 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be between 0 and 5, got {}", value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A vertex of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub nid: Nid,
    pub title: String,
    /// Alternate labels
    #[serde(default)]
    pub altnames: Vec<String>,
    /// Alternate plural label
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    pub kind: NodeKind,
}

impl Node {
    pub fn class(&self) -> NodeClass {
        self.kind.class()
    }

    pub fn slug(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Metatype(m) => Some(&m.slug),
            NodeKind::Nodetype(n) => Some(&n.slug),
            NodeKind::Gbobject(g) => Some(&g.slug),
            _ => None,
        }
    }

    /// Parent in the type tree, for Metatypes and Nodetypes.
    pub fn parent(&self) -> Option<Nid> {
        match &self.kind {
            NodeKind::Metatype(m) => m.parent,
            NodeKind::Nodetype(n) => n.parent,
            _ => None,
        }
    }

    /// Whether this node lives in a parent tree at all.
    pub fn is_tree_node(&self) -> bool {
        matches!(self.kind, NodeKind::Metatype(_) | NodeKind::Nodetype(_))
    }

    pub fn publication(&self) -> Option<&Publication> {
        match &self.kind {
            NodeKind::Nodetype(n) => Some(&n.publication),
            NodeKind::Gbobject(g) => Some(&g.publication),
            _ => None,
        }
    }

    pub fn publication_mut(&mut self) -> Option<&mut Publication> {
        match &mut self.kind {
            NodeKind::Nodetype(n) => Some(&mut n.publication),
            NodeKind::Gbobject(g) => Some(&mut g.publication),
            _ => None,
        }
    }

    pub fn as_metatype(&self) -> Option<&Metatype> {
        match &self.kind {
            NodeKind::Metatype(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_nodetype(&self) -> Option<&Nodetype> {
        match &self.kind {
            NodeKind::Nodetype(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_gbobject(&self) -> Option<&Gbobject> {
        match &self.kind {
            NodeKind::Gbobject(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_relationtype(&self) -> Option<&RelationtypeSpec> {
        match &self.as_nodetype()?.specialization {
            TypeSpecialization::Relationtype(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_attributetype(&self) -> Option<&AttributetypeSpec> {
        match &self.as_nodetype()?.specialization {
            TypeSpecialization::Attributetype(spec) => Some(spec),
            _ => None,
        }
    }

    /// Alternate names rendered as a comma-delimited string.
    pub fn altnames_string(&self) -> String {
        self.altnames.join(", ")
    }

    /// Every Nid this node refers to.
    pub fn references(&self) -> Vec<Nid> {
        let mut refs = Vec::new();
        match &self.kind {
            NodeKind::Metatype(m) => refs.extend(m.parent),
            NodeKind::Nodetype(n) => {
                refs.extend(n.parent);
                refs.extend(&n.metatypes);
                refs.extend(&n.related);
                refs.extend(n.specialization.references());
            }
            NodeKind::Gbobject(g) => {
                refs.extend(&g.objecttypes);
                refs.extend(&g.related);
                refs.extend(g.specialization.references());
            }
            NodeKind::AttributeSpecification(s) => {
                refs.push(s.attributetype);
                refs.extend(&s.subjects);
            }
            NodeKind::RelationSpecification(s) => {
                refs.push(s.relationtype);
                refs.extend(&s.subjects);
            }
            NodeKind::NodeSpecification(s) => {
                refs.push(s.subject);
                refs.extend(&s.relations);
                refs.extend(&s.attributes);
            }
            NodeKind::Union(s) | NodeKind::Complement(s) | NodeKind::Intersection(s) => {
                refs.extend(&s.nodetypes);
            }
        }
        refs
    }
}

/// Parses a comma-delimited tag/altname string.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// NODE KIND
// =============================================================================

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum NodeKind {
    Metatype(Metatype),
    Nodetype(Nodetype),
    Gbobject(Gbobject),
    AttributeSpecification(AttributeSpecification),
    RelationSpecification(RelationSpecification),
    NodeSpecification(NodeSpecification),
    Union(SetExpression),
    Complement(SetExpression),
    Intersection(SetExpression),
}

impl NodeKind {
    pub fn class(&self) -> NodeClass {
        match self {
            Self::Metatype(_) => NodeClass::Metatype,
            Self::Nodetype(n) => n.specialization.class(),
            Self::Gbobject(g) => match g.specialization {
                ObjectSpecialization::System(_) => NodeClass::System,
                _ => NodeClass::Node,
            },
            // Shares its two-letter code with Attribute.
            Self::AttributeSpecification(_) => NodeClass::Attribute,
            Self::RelationSpecification(_) => NodeClass::RelationSpecification,
            Self::NodeSpecification(_) => NodeClass::NodeSpecification,
            Self::Union(_) => NodeClass::Union,
            Self::Complement(_) => NodeClass::Complement,
            Self::Intersection(_) => NodeClass::Intersection,
        }
    }

    /// Get the type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Metatype(_) => "Metatype",
            Self::Nodetype(n) => n.specialization.type_name(),
            Self::Gbobject(g) => g.specialization.type_name(),
            Self::AttributeSpecification(_) => "AttributeSpecification",
            Self::RelationSpecification(_) => "RelationSpecification",
            Self::NodeSpecification(_) => "NodeSpecification",
            Self::Union(_) => "Union",
            Self::Complement(_) => "Complement",
            Self::Intersection(_) => "Intersection",
        }
    }
}

impl From<Metatype> for NodeKind {
    fn from(m: Metatype) -> Self {
        NodeKind::Metatype(m)
    }
}

impl From<Nodetype> for NodeKind {
    fn from(n: Nodetype) -> Self {
        NodeKind::Nodetype(n)
    }
}

impl From<Gbobject> for NodeKind {
    fn from(g: Gbobject) -> Self {
        NodeKind::Gbobject(g)
    }
}

impl From<AttributeSpecification> for NodeKind {
    fn from(s: AttributeSpecification) -> Self {
        NodeKind::AttributeSpecification(s)
    }
}

impl From<RelationSpecification> for NodeKind {
    fn from(s: RelationSpecification) -> Self {
        NodeKind::RelationSpecification(s)
    }
}

impl From<NodeSpecification> for NodeKind {
    fn from(s: NodeSpecification) -> Self {
        NodeKind::NodeSpecification(s)
    }
}

// =============================================================================
// NEW NODE
// =============================================================================

/// A node that has not been assigned a Nid yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    pub title: String,
    #[serde(default)]
    pub altnames: Vec<String>,
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    pub kind: NodeKind,
}

impl NewNode {
    pub fn new(title: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        Self {
            title: title.into(),
            altnames: Vec::new(),
            plural: None,
            rating: None,
            kind: kind.into(),
        }
    }

    pub fn with_altnames<I, S>(mut self, altnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.altnames = altnames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub(crate) fn into_node(self, nid: Nid) -> Node {
        Node {
            nid,
            title: self.title,
            altnames: self.altnames,
            plural: self.plural,
            rating: self.rating,
            kind: self.kind,
        }
    }
}
