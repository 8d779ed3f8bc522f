use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use crate::ontology::datatype::ValueError;
use crate::ontology::{Nid, Status};

/// Errors raised by graph writes and hierarchy reads.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A parent assignment would close a loop, or a stored parent chain loops.
    #[error("cycle in parent chain: {}", format_chain(.chain))]
    Cycle { chain: Vec<Nid> },

    #[error("slug '{slug}' is already used ({scope})")]
    DuplicateSlug { slug: String, scope: SlugScope },

    /// The 6-tuple of a relation or attribute already exists.
    #[error("duplicate {kind} {key}: already stored as edge {existing}")]
    DuplicateEdge {
        kind: EdgeKindName,
        key: String,
        existing: Nid,
    },

    #[error("{nid} is still referenced by {}", format_list(.referenced_by))]
    ReferentialIntegrity { nid: Nid, referenced_by: Vec<Nid> },

    #[error("no node or edge with id {0}")]
    NotFound(Nid),

    #[error("{nid} is a {actual}, expected {expected}")]
    WrongKind {
        nid: Nid,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid value for attributetype {attributetype}: {source}")]
    InvalidValue {
        attributetype: Nid,
        #[source]
        source: ValueError,
    },

    #[error("invalid slug '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidSlug(String),

    #[error("cannot change status of {nid} from {from} to {to}")]
    InvalidTransition { nid: Nid, from: Status, to: Status },

    #[error("{0}")]
    Invalid(String),
}

/// Which uniqueness rule a slug violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugScope {
    /// Unique across all metatypes
    Metatypes,
    /// Unique among nodetypes created on the same day
    NodetypesOn(NaiveDate),
    /// Unique among objects created on the same day
    ObjectsOn(NaiveDate),
}

impl fmt::Display for SlugScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metatypes => write!(f, "unique across metatypes"),
            Self::NodetypesOn(date) => write!(f, "unique among nodetypes created on {}", date),
            Self::ObjectsOn(date) => write!(f, "unique among objects created on {}", date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKindName {
    Relation,
    Attribute,
}

impl fmt::Display for EdgeKindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relation => write!(f, "relation"),
            Self::Attribute => write!(f, "attribute"),
        }
    }
}

fn format_chain(chain: &[Nid]) -> String {
    chain
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_list(nids: &[Nid]) -> String {
    nids.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_chain() {
        let err = GraphError::Cycle {
            chain: vec![Nid(1), Nid(2), Nid(1)],
        };
        assert_eq!(err.to_string(), "cycle in parent chain: 1 -> 2 -> 1");
    }

    #[test]
    fn test_duplicate_slug_message_names_scope() {
        let date = NaiveDate::from_ymd_opt(2012, 1, 5).unwrap();
        let err = GraphError::DuplicateSlug {
            slug: "car".into(),
            scope: SlugScope::NodetypesOn(date),
        };
        assert!(err.to_string().contains("created on 2012-01-05"));
    }
}
