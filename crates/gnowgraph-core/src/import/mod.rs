//! Bulk import of an ontology from a YAML or JSON document.
//!
//! Records reference each other by slug. Slugs defined earlier in the same
//! document win over nodes already in the graph. The whole document is
//! applied in one transaction: either every record lands or none does.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::graph::{Graph, GraphError};
use crate::ontology::{
    AttributeScopes, AttributetypeSpec, DataType, Gbobject, Metatype, Nid, Node, Nodetype,
    RelationScopes, RelationtypeSpec, TypeSpecialization,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse import document: {0}")]
    Parse(String),

    #[error("{record}: unknown slug '{slug}'")]
    UnknownSlug { record: String, slug: String },

    #[error("{record}: slug '{slug}' matches several nodes")]
    AmbiguousSlug { record: String, slug: String },

    #[error("{record}: {message}")]
    Invalid { record: String, message: String },

    #[error("{record}: {source}")]
    Graph {
        record: String,
        #[source]
        source: GraphError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportDocument {
    pub metatypes: Vec<MetatypeRecord>,
    pub nodetypes: Vec<NodetypeRecord>,
    pub relationtypes: Vec<RelationtypeRecord>,
    pub attributetypes: Vec<AttributetypeRecord>,
    pub objects: Vec<ObjectRecord>,
    pub relations: Vec<RelationRecord>,
    pub attributes: Vec<AttributeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetatypeRecord {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodetypeRecord {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub metatypes: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub altnames: Vec<String>,
    #[serde(default)]
    pub plural: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationtypeRecord {
    pub title: String,
    pub slug: String,
    pub inverse: String,
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributetypeRecord {
    pub title: String,
    pub slug: String,
    pub subjecttype: String,
    /// Code, field name or snake_case name of the data type.
    pub data_type: String,
    #[serde(default)]
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub objecttypes: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub left: String,
    pub relationtype: String,
    pub right: String,
    #[serde(default)]
    pub scopes: RelationScopes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub subject: String,
    pub attributetype: String,
    pub value: String,
    #[serde(default)]
    pub scopes: AttributeScopes,
}

/// Nids created by an import, per record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub metatypes: Vec<Nid>,
    pub nodetypes: Vec<Nid>,
    pub relationtypes: Vec<Nid>,
    pub attributetypes: Vec<Nid>,
    pub objects: Vec<Nid>,
    pub relations: Vec<Nid>,
    pub attributes: Vec<Nid>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.metatypes.len()
            + self.nodetypes.len()
            + self.relationtypes.len()
            + self.attributetypes.len()
            + self.objects.len()
            + self.relations.len()
            + self.attributes.len()
    }
}

impl ImportDocument {
    pub fn from_yaml(text: &str) -> Result<Self, ImportError> {
        serde_yaml::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        serde_json::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))
    }

    /// Reads a document, choosing the format by extension. Anything other
    /// than `.json` is read as YAML.
    pub fn from_file(path: &Path) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path).map_err(|e| ImportError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_yaml(&text),
        }
    }

    /// Applies the document to `graph` in a single transaction.
    pub fn apply(&self, graph: &mut Graph) -> Result<ImportReport, ImportError> {
        let report = graph.transaction(|tx| Importer::new(tx).run(self))?;
        info!(records = report.total(), "import complete");
        Ok(report)
    }
}

struct Importer<'g> {
    graph: &'g mut Graph,
    slugs: HashMap<String, Nid>,
}

fn graph_err(record: &str) -> impl FnOnce(GraphError) -> ImportError + '_ {
    move |source| ImportError::Graph {
        record: record.to_string(),
        source,
    }
}

impl<'g> Importer<'g> {
    fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            slugs: HashMap::new(),
        }
    }

    fn resolve(&self, record: &str, slug: &str, accept: fn(&Node) -> bool) -> Result<Nid, ImportError> {
        if let Some(nid) = self.slugs.get(slug) {
            return Ok(*nid);
        }
        let found: Vec<&Node> = self
            .graph
            .find_by_slug(slug)
            .into_iter()
            .filter(|n| accept(n))
            .collect();
        match found.as_slice() {
            [node] => Ok(node.nid),
            [] => Err(ImportError::UnknownSlug {
                record: record.to_string(),
                slug: slug.to_string(),
            }),
            _ => Err(ImportError::AmbiguousSlug {
                record: record.to_string(),
                slug: slug.to_string(),
            }),
        }
    }

    fn resolve_all(
        &self,
        record: &str,
        slugs: &[String],
        accept: fn(&Node) -> bool,
    ) -> Result<Vec<Nid>, ImportError> {
        slugs.iter().map(|s| self.resolve(record, s, accept)).collect()
    }

    fn remember(&mut self, slug: &str, nid: Nid) {
        debug!(slug, %nid, "imported");
        self.slugs.insert(slug.to_string(), nid);
    }

    fn run(mut self, doc: &ImportDocument) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();
        let any: fn(&Node) -> bool = |_| true;
        let metatype: fn(&Node) -> bool = |n| n.as_metatype().is_some();
        let nodetype: fn(&Node) -> bool = |n| n.as_nodetype().is_some();

        for r in &doc.metatypes {
            let record = format!("metatype '{}'", r.slug);
            let mut payload = Metatype::new(&r.slug);
            if let Some(description) = &r.description {
                payload = payload.with_description(description);
            }
            if let Some(parent) = &r.parent {
                payload = payload.with_parent(self.resolve(&record, parent, metatype)?);
            }
            let nid = self
                .graph
                .create_metatype(&r.title, payload)
                .map_err(graph_err(&record))?;
            self.remember(&r.slug, nid);
            report.metatypes.push(nid);
        }

        for r in &doc.nodetypes {
            let record = format!("nodetype '{}'", r.slug);
            let mut payload = Nodetype::objecttype(&r.slug)
                .with_metatypes(self.resolve_all(&record, &r.metatypes, metatype)?)
                .with_authors(r.authors.iter().cloned())
                .with_content(&r.content)
                .with_tags(r.tags.iter().cloned());
            if let Some(parent) = &r.parent {
                payload = payload.with_parent(self.resolve(&record, parent, nodetype)?);
            }
            let nid = self
                .graph
                .create_nodetype(&r.title, payload)
                .map_err(graph_err(&record))?;
            if !r.altnames.is_empty() || r.plural.is_some() {
                let (altnames, plural) = (r.altnames.clone(), r.plural.clone());
                self.graph
                    .update_node(nid, |n| {
                        n.altnames = altnames;
                        n.plural = plural;
                    })
                    .map_err(graph_err(&record))?;
            }
            self.remember(&r.slug, nid);
            report.nodetypes.push(nid);
        }

        for r in &doc.relationtypes {
            let record = format!("relationtype '{}'", r.slug);
            let spec = RelationtypeSpec::new(
                &r.inverse,
                self.resolve(&record, &r.left, any)?,
                self.resolve(&record, &r.right, any)?,
            );
            let payload = Nodetype::relationtype(&r.slug, spec).with_authors(r.authors.iter().cloned());
            let nid = self
                .graph
                .create_nodetype(&r.title, payload)
                .map_err(graph_err(&record))?;
            self.remember(&r.slug, nid);
            report.relationtypes.push(nid);
        }

        for r in &doc.attributetypes {
            let record = format!("attributetype '{}'", r.slug);
            let data_type: DataType = r.data_type.parse().map_err(|e| ImportError::Invalid {
                record: record.clone(),
                message: format!("{}", e),
            })?;
            let spec = AttributetypeSpec::new(self.resolve(&record, &r.subjecttype, any)?, data_type);
            let payload =
                Nodetype::attributetype(&r.slug, spec).with_authors(r.authors.iter().cloned());
            let nid = self
                .graph
                .create_nodetype(&r.title, payload)
                .map_err(graph_err(&record))?;
            self.remember(&r.slug, nid);
            report.attributetypes.push(nid);
        }

        for r in &doc.objects {
            let record = format!("object '{}'", r.slug);
            let objecttype: fn(&Node) -> bool = |n| {
                n.as_nodetype()
                    .is_some_and(|t| matches!(t.specialization, TypeSpecialization::Objecttype))
            };
            let payload = Gbobject::new(&r.slug)
                .with_objecttypes(self.resolve_all(&record, &r.objecttypes, objecttype)?)
                .with_authors(r.authors.iter().cloned())
                .with_content(&r.content);
            let nid = self
                .graph
                .create_gbobject(&r.title, payload)
                .map_err(graph_err(&record))?;
            self.remember(&r.slug, nid);
            report.objects.push(nid);
        }

        for r in &doc.relations {
            let record = format!("relation '{} {} {}'", r.left, r.relationtype, r.right);
            let left = self.resolve(&record, &r.left, any)?;
            let relationtype = self.resolve(&record, &r.relationtype, nodetype)?;
            let right = self.resolve(&record, &r.right, any)?;
            let nid = self
                .graph
                .create_relation(left, relationtype, right, r.scopes.clone())
                .map_err(graph_err(&record))?;
            report.relations.push(nid);
        }

        for r in &doc.attributes {
            let record = format!("attribute '{} {}'", r.subject, r.attributetype);
            let subject = self.resolve(&record, &r.subject, any)?;
            let attributetype = self.resolve(&record, &r.attributetype, nodetype)?;
            let nid = self
                .graph
                .create_attribute_from_str(subject, attributetype, &r.value, r.scopes.clone())
                .map_err(graph_err(&record))?;
            report.attributes.push(nid);
        }

        Ok(report)
    }
}
