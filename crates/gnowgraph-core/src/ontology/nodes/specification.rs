//! Specification records and set-algebra groupings.
//!
//! These are descriptive, read-mostly records. Their only invariant is that
//! every referenced Nid exists.

use serde::{Deserialize, Serialize};

use crate::ontology::Nid;

/// "the {attributetype} of {subjects}"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpecification {
    pub attributetype: Nid,
    #[serde(default)]
    pub subjects: Vec<Nid>,
}

impl AttributeSpecification {
    pub fn new(attributetype: Nid, subjects: impl IntoIterator<Item = Nid>) -> Self {
        Self {
            attributetype,
            subjects: subjects.into_iter().collect(),
        }
    }
}

/// "the {relationtype} of {subjects}"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpecification {
    pub relationtype: Nid,
    #[serde(default)]
    pub subjects: Vec<Nid>,
}

impl RelationSpecification {
    pub fn new(relationtype: Nid, subjects: impl IntoIterator<Item = Nid>) -> Self {
        Self {
            relationtype,
            subjects: subjects.into_iter().collect(),
        }
    }
}

/// "the {subject} with {relations}, {attributes}"
///
/// `relations` and `attributes` hold the Nids of Relation and Attribute
/// edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpecification {
    pub subject: Nid,
    #[serde(default)]
    pub relations: Vec<Nid>,
    #[serde(default)]
    pub attributes: Vec<Nid>,
}

impl NodeSpecification {
    pub fn new(subject: Nid) -> Self {
        Self {
            subject,
            relations: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_relations(mut self, relations: impl IntoIterator<Item = Nid>) -> Self {
        self.relations = relations.into_iter().collect();
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Nid>) -> Self {
        self.attributes = attributes.into_iter().collect();
        self
    }
}

/// Operand set of a Union, Complement or Intersection. Not evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SetExpression {
    #[serde(default)]
    pub nodetypes: Vec<Nid>,
}

impl SetExpression {
    pub fn new(nodetypes: impl IntoIterator<Item = Nid>) -> Self {
        Self {
            nodetypes: nodetypes.into_iter().collect(),
        }
    }
}
