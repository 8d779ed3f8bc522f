//! Metatype: a category node in a strict tree.

use serde::{Deserialize, Serialize};

use crate::ontology::Nid;

/// A category node. Slugs are unique across all Metatypes and the parent
/// chain is acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metatype {
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Parent metatype; `None` for a root
    #[serde(default)]
    pub parent: Option<Nid>,
}

impl Metatype {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            description: String::new(),
            parent: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent(mut self, parent: Nid) -> Self {
        self.parent = Some(parent);
        self
    }
}
