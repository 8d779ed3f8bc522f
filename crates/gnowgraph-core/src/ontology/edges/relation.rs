//! Relation: an instance of a Relationtype binding two subjects.

use serde::{Deserialize, Serialize};

use super::normalize_scope;
use crate::ontology::Nid;

/// `left_subject --relationtype--> right_subject`, each slot optionally
/// qualified by a scope string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default)]
    pub left_scope: Option<String>,
    pub left_subject: Nid,
    #[serde(default)]
    pub relationtype_scope: Option<String>,
    pub relationtype: Nid,
    #[serde(default)]
    pub right_scope: Option<String>,
    pub right_subject: Nid,
}

impl Relation {
    pub fn new(left_subject: Nid, relationtype: Nid, right_subject: Nid) -> Self {
        Self {
            left_scope: None,
            left_subject,
            relationtype_scope: None,
            relationtype,
            right_scope: None,
            right_subject,
        }
    }

    pub fn with_scopes(mut self, scopes: RelationScopes) -> Self {
        self.left_scope = normalize_scope(scopes.left);
        self.relationtype_scope = normalize_scope(scopes.relationtype);
        self.right_scope = normalize_scope(scopes.right);
        self
    }

    /// The uniqueness key of this relation.
    pub fn key(&self) -> RelationKey {
        RelationKey {
            left_scope: self.left_scope.clone(),
            left_subject: self.left_subject,
            relationtype_scope: self.relationtype_scope.clone(),
            relationtype: self.relationtype,
            right_scope: self.right_scope.clone(),
            right_subject: self.right_subject,
        }
    }

    pub fn scopes(&self) -> [Option<&str>; 3] {
        [
            self.left_scope.as_deref(),
            self.relationtype_scope.as_deref(),
            self.right_scope.as_deref(),
        ]
    }
}

/// Optional qualifiers for the three slots of a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationScopes {
    #[serde(default)]
    pub left: Option<String>,
    #[serde(default)]
    pub relationtype: Option<String>,
    #[serde(default)]
    pub right: Option<String>,
}

impl RelationScopes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn left(mut self, scope: impl Into<String>) -> Self {
        self.left = Some(scope.into());
        self
    }

    pub fn relationtype(mut self, scope: impl Into<String>) -> Self {
        self.relationtype = Some(scope.into());
        self
    }

    pub fn right(mut self, scope: impl Into<String>) -> Self {
        self.right = Some(scope.into());
        self
    }
}

/// The 6-tuple that must be unique across all relations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    pub left_scope: Option<String>,
    pub left_subject: Nid,
    pub relationtype_scope: Option<String>,
    pub relationtype: Nid,
    pub right_scope: Option<String>,
    pub right_subject: Nid,
}

impl std::fmt::Display for RelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.left_scope.as_deref().unwrap_or(""),
            self.left_subject,
            self.relationtype_scope.as_deref().unwrap_or(""),
            self.relationtype,
            self.right_scope.as_deref().unwrap_or(""),
            self.right_subject
        )
    }
}
