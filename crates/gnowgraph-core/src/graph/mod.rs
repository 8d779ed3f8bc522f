//! In-memory typed graph store.
//!
//! [`Graph`] owns every node, edge, dependency and discussion record and
//! enforces the structural invariants on write:
//!
//! - parent chains of Metatypes and Nodetypes are acyclic
//! - slugs are unique per their rule (global or per creation date)
//! - relation and attribute 6-tuples are unique
//! - edges never outlive the nodes they bind
//!
//! Multi-step writes go through [`Graph::transaction`], which works on a copy
//! and commits only when the closure succeeds.

mod dependencies;
mod edges;
mod error;
mod hierarchy;
mod publication;
mod specification;

pub use edges::{Cascade, RelationsOf};
pub use error::{EdgeKindName, GraphError, SlugScope};
pub use publication::{linebreaks, strip_tags};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::GraphConfig;
use crate::discussion::Discussion;
use crate::ontology::{AttributeKey, Edge, EdgeKind, Nid, Node, RelationKey};

pub type Result<T> = std::result::Result<T, GraphError>;

/// A `dependent depends_on prior` link between two publishable nodes.
///
/// `prior_nodes` and `posterior_nodes` are both read from this one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub dependent: Nid,
    pub prior: Nid,
}

/// The typed graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<Nid, Node>,
    edges: BTreeMap<Nid, Edge>,
    dependencies: BTreeSet<Dependency>,
    discussions: Vec<Discussion>,
    last_nid: u64,
    last_discussion_id: u64,
    config: GraphConfig,
    relation_keys: HashMap<RelationKey, Nid>,
    attribute_keys: HashMap<AttributeKey, Nid>,
}

/// Serializable form of a [`Graph`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub last_nid: u64,
    #[serde(default)]
    pub last_discussion_id: u64,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub discussions: Vec<Discussion>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GraphConfig) {
        self.config = config;
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn node(&self, nid: Nid) -> Result<&Node> {
        self.nodes.get(&nid).ok_or(GraphError::NotFound(nid))
    }

    pub fn edge(&self, nid: Nid) -> Result<&Edge> {
        self.edges.get(&nid).ok_or(GraphError::NotFound(nid))
    }

    pub fn get_node(&self, nid: Nid) -> Option<&Node> {
        self.nodes.get(&nid)
    }

    pub fn get_edge(&self, nid: Nid) -> Option<&Edge> {
        self.edges.get(&nid)
    }

    /// Whether any node or edge carries this id.
    pub fn contains(&self, nid: Nid) -> bool {
        self.nodes.contains_key(&nid) || self.edges.contains_key(&nid)
    }

    /// Title of a node or edge. Missing ids resolve to `None`.
    pub fn title_of(&self, nid: Nid) -> Option<&str> {
        self.nodes
            .get(&nid)
            .map(|n| n.title.as_str())
            .or_else(|| self.edges.get(&nid).map(|e| e.title.as_str()))
    }

    /// Resolves an id to whichever record carries it.
    pub fn resolve(&self, nid: Nid) -> Option<Element<'_>> {
        if let Some(node) = self.nodes.get(&nid) {
            return Some(Element::Node(node));
        }
        self.edges.get(&nid).map(Element::Edge)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Finds a node by slug, for kinds that carry one.
    pub fn find_by_slug(&self, slug: &str) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.slug() == Some(slug))
            .collect()
    }

    /// Finds nodes by exact title.
    pub fn find_by_title(&self, title: &str) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.title == title).collect()
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Runs `f` against a working copy and commits it only on success.
    pub fn transaction<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Graph) -> std::result::Result<T, E>,
    {
        let mut working = self.clone();
        let out = f(&mut working)?;
        *self = working;
        Ok(out)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            last_nid: self.last_nid,
            last_discussion_id: self.last_discussion_id,
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            dependencies: self.dependencies.iter().copied().collect(),
            discussions: self.discussions.clone(),
        }
    }

    /// Rebuilds a graph from a snapshot, re-checking ids and edge keys.
    pub fn restore(snapshot: GraphSnapshot, config: GraphConfig) -> Result<Self> {
        let mut graph = Graph::with_config(config);
        let mut max_nid = snapshot.last_nid;

        for node in snapshot.nodes {
            max_nid = max_nid.max(node.nid.get());
            if graph.nodes.insert(node.nid, node).is_some() {
                return Err(GraphError::Invalid("snapshot repeats a node id".into()));
            }
        }

        for edge in snapshot.edges {
            max_nid = max_nid.max(edge.nid.get());
            if graph.nodes.contains_key(&edge.nid) {
                return Err(GraphError::Invalid(format!(
                    "snapshot uses id {} for both a node and an edge",
                    edge.nid
                )));
            }
            graph.index_edge(&edge)?;
            graph.edges.insert(edge.nid, edge);
        }

        for edge in graph.edges.values() {
            for referenced in edge.references() {
                if !graph.contains(referenced) {
                    return Err(GraphError::NotFound(referenced));
                }
            }
        }

        graph.dependencies = snapshot.dependencies.into_iter().collect();
        graph.last_discussion_id = snapshot
            .discussions
            .iter()
            .map(|d| d.id)
            .max()
            .unwrap_or(0)
            .max(snapshot.last_discussion_id);
        graph.discussions = snapshot.discussions;
        graph.last_nid = max_nid;

        Ok(graph)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn allocate_nid(&mut self) -> Nid {
        self.last_nid += 1;
        Nid(self.last_nid)
    }

    /// Registers the uniqueness key of an edge. Fails if the key is taken.
    fn index_edge(&mut self, edge: &Edge) -> Result<()> {
        match &edge.kind {
            EdgeKind::Relation(relation) => {
                let key = relation.key();
                if let Some(existing) = self.relation_keys.get(&key) {
                    return Err(GraphError::DuplicateEdge {
                        kind: EdgeKindName::Relation,
                        key: key.to_string(),
                        existing: *existing,
                    });
                }
                self.relation_keys.insert(key, edge.nid);
            }
            EdgeKind::Attribute(attribute) => {
                let key = attribute.key();
                if let Some(existing) = self.attribute_keys.get(&key) {
                    return Err(GraphError::DuplicateEdge {
                        kind: EdgeKindName::Attribute,
                        key: key.to_string(),
                        existing: *existing,
                    });
                }
                self.attribute_keys.insert(key, edge.nid);
            }
        }
        Ok(())
    }

    fn unindex_edge(&mut self, edge: &Edge) {
        match &edge.kind {
            EdgeKind::Relation(relation) => {
                self.relation_keys.remove(&relation.key());
            }
            EdgeKind::Attribute(attribute) => {
                self.attribute_keys.remove(&attribute.key());
            }
        }
    }

    pub(crate) fn discussions_mut(&mut self) -> &mut Vec<Discussion> {
        &mut self.discussions
    }

    pub(crate) fn discussion_records(&self) -> &[Discussion] {
        &self.discussions
    }

    pub(crate) fn next_discussion_id(&mut self) -> u64 {
        self.last_discussion_id += 1;
        self.last_discussion_id
    }
}

/// A resolved graph element.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> Element<'a> {
    pub fn nid(&self) -> Nid {
        match self {
            Self::Node(n) => n.nid,
            Self::Edge(e) => e.nid,
        }
    }

    pub fn title(&self) -> &'a str {
        match self {
            Self::Node(n) => &n.title,
            Self::Edge(e) => &e.title,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Node(n) => n.kind.type_name(),
            Self::Edge(e) => match e.kind {
                EdgeKind::Relation(_) => "Relation",
                EdgeKind::Attribute(_) => "Attribute",
            },
        }
    }
}
