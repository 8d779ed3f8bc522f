//! Edge (arc) types for the ontology graph.
//!
//! An edge carries nothing beyond its Nid and title; the payload is either a
//! [`Relation`] (an instance of a Relationtype) or an [`Attribute`] (an
//! instance of an Attributetype).

mod attribute;
mod relation;

pub use attribute::*;
pub use relation::*;

use serde::{Deserialize, Serialize};

use super::{Nid, NodeClass};

/// Maximum length of any scope qualifier.
pub const MAX_SCOPE_LEN: usize = 50;

/// An arc of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub nid: Nid,
    pub title: String,
    pub kind: EdgeKind,
}

/// Kind-specific payload of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edge_type", rename_all = "snake_case")]
pub enum EdgeKind {
    Relation(Relation),
    Attribute(Attribute),
}

impl Edge {
    pub fn class(&self) -> NodeClass {
        match self.kind {
            EdgeKind::Relation(_) => NodeClass::Relation,
            EdgeKind::Attribute(_) => NodeClass::Attribute,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match &self.kind {
            EdgeKind::Relation(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match &self.kind {
            EdgeKind::Attribute(a) => Some(a),
            _ => None,
        }
    }

    /// Nodes this edge binds.
    pub fn references(&self) -> Vec<Nid> {
        match &self.kind {
            EdgeKind::Relation(r) => vec![r.left_subject, r.relationtype, r.right_subject],
            EdgeKind::Attribute(a) => vec![a.subject, a.attributetype],
        }
    }
}

/// Treats an empty or whitespace-only scope as absent.
pub(crate) fn normalize_scope(scope: Option<String>) -> Option<String> {
    scope
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
