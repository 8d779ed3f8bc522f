//! Attribute: an instance of an Attributetype applied to a subject.

use serde::{Deserialize, Serialize};

use super::normalize_scope;
use crate::ontology::{AttributeValue, Nid};

/// `subject has attributetype = value`, with optional scopes.
///
/// The serialized value is always derived from `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub subject_scope: Option<String>,
    pub subject: Nid,
    #[serde(default)]
    pub attributetype_scope: Option<String>,
    pub attributetype: Nid,
    #[serde(default)]
    pub value_scope: Option<String>,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(subject: Nid, attributetype: Nid, value: AttributeValue) -> Self {
        Self {
            subject_scope: None,
            subject,
            attributetype_scope: None,
            attributetype,
            value_scope: None,
            value,
        }
    }

    pub fn with_scopes(mut self, scopes: AttributeScopes) -> Self {
        self.subject_scope = normalize_scope(scopes.subject);
        self.attributetype_scope = normalize_scope(scopes.attributetype);
        self.value_scope = normalize_scope(scopes.value);
        self
    }

    pub fn svalue(&self) -> String {
        self.value.svalue()
    }

    /// The uniqueness key of this attribute.
    pub fn key(&self) -> AttributeKey {
        AttributeKey {
            subject_scope: self.subject_scope.clone(),
            subject: self.subject,
            attributetype_scope: self.attributetype_scope.clone(),
            attributetype: self.attributetype,
            value_scope: self.value_scope.clone(),
            svalue: self.svalue(),
        }
    }

    pub fn scopes(&self) -> [Option<&str>; 3] {
        [
            self.subject_scope.as_deref(),
            self.attributetype_scope.as_deref(),
            self.value_scope.as_deref(),
        ]
    }
}

/// Optional qualifiers for the subject, attributetype and value slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeScopes {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub attributetype: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl AttributeScopes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn subject(mut self, scope: impl Into<String>) -> Self {
        self.subject = Some(scope.into());
        self
    }

    pub fn attributetype(mut self, scope: impl Into<String>) -> Self {
        self.attributetype = Some(scope.into());
        self
    }

    pub fn value(mut self, scope: impl Into<String>) -> Self {
        self.value = Some(scope.into());
        self
    }
}

/// The 6-tuple that must be unique across all attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeKey {
    pub subject_scope: Option<String>,
    pub subject: Nid,
    pub attributetype_scope: Option<String>,
    pub attributetype: Nid,
    pub value_scope: Option<String>,
    pub svalue: String,
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.subject_scope.as_deref().unwrap_or(""),
            self.subject,
            self.attributetype_scope.as_deref().unwrap_or(""),
            self.attributetype,
            self.value_scope.as_deref().unwrap_or(""),
            self.svalue
        )
    }
}
