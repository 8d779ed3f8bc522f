//! Ontology data model for the typed graph.
//!
//! Every vertex and arc in the graph is identified by a [`Nid`] and carries a
//! title. Vertices are [`Node`]s, arcs are [`Edge`]s:
//!
//! - **Nodes**: Metatype, Nodetype (and its Objecttype / Relationtype /
//!   Attributetype / Processtype / Systemtype specializations), Gbobject,
//!   specification records and set-algebra groupings
//! - **Edges**: Relation and Attribute instances
//!
//! The model is a flat record with a `kind` discriminant. Shared fields live
//! on [`Node`], specialized fields live in the [`NodeKind`] payload.

pub mod datatype;
pub mod edges;
pub mod nodes;

pub use datatype::{AttributeValue, DataType};
pub use edges::{
    Attribute, AttributeKey, AttributeScopes, Edge, EdgeKind, Relation, RelationKey,
    RelationScopes, MAX_SCOPE_LEN,
};
pub use nodes::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// NID
// =============================================================================

/// Universal identifier of every node and edge in the graph.
///
/// Allocated by the graph store, monotonically increasing and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nid(pub u64);

impl Nid {
    /// Returns the raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Renders the id in lowercase base 36, as used by short URLs.
    pub fn to_base36(self) -> String {
        const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut n = self.0;
        if n == 0 {
            return "0".to_string();
        }
        let mut out = Vec::new();
        while n > 0 {
            out.push(DIGITS[(n % 36) as usize]);
            n /= 36;
        }
        out.reverse();
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl fmt::Display for Nid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Nid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Nid)
    }
}

impl From<u64> for Nid {
    fn from(value: u64) -> Self {
        Nid(value)
    }
}

// =============================================================================
// NODE CLASS
// =============================================================================

/// Classes of graph element, used where a type applies to "any node of
/// class X" (the applicable-nodetype fields of relation and attribute types).
///
/// The two-letter codes are the stable external representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeClass {
    #[serde(rename = "ND")]
    Node,
    #[serde(rename = "ED")]
    Edge,
    #[serde(rename = "NT")]
    Nodetype,
    #[serde(rename = "ET")]
    Edgetype,
    #[default]
    #[serde(rename = "OT")]
    Objecttype,
    #[serde(rename = "RT")]
    Relationtype,
    #[serde(rename = "MT")]
    Metatype,
    #[serde(rename = "AT")]
    Attributetype,
    #[serde(rename = "RN")]
    Relation,
    #[serde(rename = "AS")]
    Attribute,
    #[serde(rename = "ST")]
    Systemtype,
    #[serde(rename = "SY")]
    System,
    #[serde(rename = "NS")]
    NodeSpecification,
    #[serde(rename = "RS")]
    RelationSpecification,
    #[serde(rename = "IN")]
    Intersection,
    #[serde(rename = "CP")]
    Complement,
    #[serde(rename = "UN")]
    Union,
}

impl NodeClass {
    pub const ALL: [NodeClass; 17] = [
        Self::Node,
        Self::Edge,
        Self::Nodetype,
        Self::Edgetype,
        Self::Objecttype,
        Self::Relationtype,
        Self::Metatype,
        Self::Attributetype,
        Self::Relation,
        Self::Attribute,
        Self::Systemtype,
        Self::System,
        Self::NodeSpecification,
        Self::RelationSpecification,
        Self::Intersection,
        Self::Complement,
        Self::Union,
    ];

    /// Two-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Node => "ND",
            Self::Edge => "ED",
            Self::Nodetype => "NT",
            Self::Edgetype => "ET",
            Self::Objecttype => "OT",
            Self::Relationtype => "RT",
            Self::Metatype => "MT",
            Self::Attributetype => "AT",
            Self::Relation => "RN",
            Self::Attribute => "AS",
            Self::Systemtype => "ST",
            Self::System => "SY",
            Self::NodeSpecification => "NS",
            Self::RelationSpecification => "RS",
            Self::Intersection => "IN",
            Self::Complement => "CP",
            Self::Union => "UN",
        }
    }

    /// Human-readable plural label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Node => "Nodes",
            Self::Edge => "Edges",
            Self::Nodetype => "Node types",
            Self::Edgetype => "Edge types",
            Self::Objecttype => "Object types",
            Self::Relationtype => "Relation types",
            Self::Metatype => "Metatypes",
            Self::Attributetype => "Attribute types",
            Self::Relation => "Relations",
            Self::Attribute => "Attributes",
            Self::Systemtype => "System type",
            Self::System => "System",
            Self::NodeSpecification => "Node specification",
            Self::RelationSpecification => "Relation specification",
            Self::Intersection => "Intersection",
            Self::Complement => "Complement",
            Self::Union => "Union",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for NodeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.code() == code)
            .ok_or_else(|| format!("unknown node class code: {}", s))
    }
}
