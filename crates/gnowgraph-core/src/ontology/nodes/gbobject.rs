//! Gbobject: an object-level instance of one or more Objecttypes.

use serde::{Deserialize, Serialize};

use super::nodetype::{default_true, Publication, Status};
use crate::ontology::Nid;

/// An object that is a member of Objecttypes.
///
/// Shares the publication contract of Nodetype. Slugs are unique per
/// creation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gbobject {
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Objecttypes this object is a member of
    #[serde(default)]
    pub objecttypes: Vec<Nid>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub sites: Vec<String>,
    #[serde(default)]
    pub related: Vec<Nid>,
    #[serde(default)]
    pub publication: Publication,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub comment_enabled: bool,
    #[serde(default = "default_true")]
    pub pingback_enabled: bool,
    #[serde(default)]
    pub login_required: bool,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub specialization: ObjectSpecialization,
}

impl Gbobject {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            content: String::new(),
            excerpt: String::new(),
            image: None,
            tags: Vec::new(),
            objecttypes: Vec::new(),
            authors: Vec::new(),
            sites: Vec::new(),
            related: Vec::new(),
            publication: Publication::default(),
            featured: false,
            comment_enabled: true,
            pingback_enabled: true,
            login_required: false,
            password: None,
            specialization: ObjectSpecialization::Plain,
        }
    }

    pub fn with_objecttypes(mut self, objecttypes: impl IntoIterator<Item = Nid>) -> Self {
        self.objecttypes = objecttypes.into_iter().collect();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_publication(mut self, publication: Publication) -> Self {
        self.publication = publication;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.publication.status = status;
        self
    }

    pub fn with_specialization(mut self, specialization: ObjectSpecialization) -> Self {
        self.specialization = specialization;
        self
    }
}

/// Process and System objects carry extra membership sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectSpecialization {
    #[default]
    Plain,
    Process(ProcessSpec),
    System(SystemSpec),
}

impl ObjectSpecialization {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Plain => "Gbobject",
            Self::Process(_) => "Process",
            Self::System(_) => "System",
        }
    }

    pub fn references(&self) -> Vec<Nid> {
        match self {
            Self::Plain => Vec::new(),
            Self::Process(p) => p
                .processtypes
                .iter()
                .chain(&p.priorstate_attributes)
                .chain(&p.priorstate_relations)
                .chain(&p.poststate_attributes)
                .chain(&p.poststate_relations)
                .copied()
                .collect(),
            Self::System(s) => s
                .systemtypes
                .iter()
                .chain(&s.gbobjects)
                .chain(&s.relations)
                .chain(&s.attributes)
                .chain(&s.processes)
                .chain(&s.systems)
                .copied()
                .collect(),
        }
    }
}

/// A process: state before and after, as attribute and relation edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcessSpec {
    #[serde(default)]
    pub processtypes: Vec<Nid>,
    #[serde(default)]
    pub priorstate_attributes: Vec<Nid>,
    #[serde(default)]
    pub priorstate_relations: Vec<Nid>,
    #[serde(default)]
    pub poststate_attributes: Vec<Nid>,
    #[serde(default)]
    pub poststate_relations: Vec<Nid>,
}

/// A system: the objects, edges, processes and nested systems it groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SystemSpec {
    #[serde(default)]
    pub systemtypes: Vec<Nid>,
    #[serde(default)]
    pub gbobjects: Vec<Nid>,
    #[serde(default)]
    pub relations: Vec<Nid>,
    #[serde(default)]
    pub attributes: Vec<Nid>,
    #[serde(default)]
    pub processes: Vec<Nid>,
    #[serde(default)]
    pub systems: Vec<Nid>,
}
