use thiserror::Error;
use tracing::debug;

use crate::config::GraphConfig;
use crate::graph::{Cascade, Graph, GraphError};
use crate::import::{ImportDocument, ImportError, ImportReport};
use crate::ontology::{
    AttributeScopes, Gbobject, Metatype, Nid, Node, Nodetype, RelationScopes, Status,
};
use crate::storage::{Storage, StorageError};

/// Owns a graph and its storage backend.
///
/// Provides a high-level API for changing the graph with automatic
/// persistence: every successful write is saved, a failed one leaves both
/// the graph and the stored snapshot untouched.
pub struct GraphManager<S: Storage> {
    storage: S,
    graph: Graph,
}

impl<S: Storage> GraphManager<S> {
    /// Opens the graph stored in `storage`, or an empty one.
    pub fn open(storage: S, config: GraphConfig) -> Result<Self, ManagerError> {
        let graph = match storage.load()? {
            Some(snapshot) => Graph::restore(snapshot, config)?,
            None => Graph::with_config(config),
        };
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "opened graph");
        Ok(Self { storage, graph })
    }

    /// Opens with the default graph configuration.
    pub fn new(storage: S) -> Result<Self, ManagerError> {
        Self::open(storage, GraphConfig::default())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Writes the current graph to storage.
    pub fn save(&self) -> Result<(), ManagerError> {
        self.storage.save(&self.graph.snapshot())?;
        Ok(())
    }

    /// Runs `edit` in a transaction and persists the result.
    pub fn apply<T, E, F>(&mut self, edit: F) -> Result<T, ManagerError>
    where
        F: FnOnce(&mut Graph) -> Result<T, E>,
        E: Into<ManagerError>,
    {
        let mut working = self.graph.clone();
        let out = edit(&mut working).map_err(Into::into)?;
        self.storage.save(&working.snapshot())?;
        self.graph = working;
        Ok(out)
    }

    pub fn create_metatype(&mut self, title: &str, metatype: Metatype) -> Result<Nid, ManagerError> {
        self.apply(|g| g.create_metatype(title, metatype))
    }

    pub fn create_nodetype(&mut self, title: &str, nodetype: Nodetype) -> Result<Nid, ManagerError> {
        self.apply(|g| g.create_nodetype(title, nodetype))
    }

    pub fn create_gbobject(&mut self, title: &str, gbobject: Gbobject) -> Result<Nid, ManagerError> {
        self.apply(|g| g.create_gbobject(title, gbobject))
    }

    pub fn update_node<F>(&mut self, nid: Nid, edit: F) -> Result<(), ManagerError>
    where
        F: FnOnce(&mut Node),
    {
        self.apply(|g| g.update_node(nid, edit))
    }

    pub fn create_relation(
        &mut self,
        left: Nid,
        relationtype: Nid,
        right: Nid,
        scopes: RelationScopes,
    ) -> Result<Nid, ManagerError> {
        self.apply(|g| g.create_relation(left, relationtype, right, scopes))
    }

    pub fn create_attribute(
        &mut self,
        subject: Nid,
        attributetype: Nid,
        raw: &str,
        scopes: AttributeScopes,
    ) -> Result<Nid, ManagerError> {
        self.apply(|g| g.create_attribute_from_str(subject, attributetype, raw, scopes))
    }

    pub fn set_status(&mut self, nid: Nid, status: Status) -> Result<(), ManagerError> {
        self.apply(|g| g.set_status(nid, status))
    }

    pub fn add_prior(&mut self, dependent: Nid, prior: Nid) -> Result<bool, ManagerError> {
        self.apply(|g| g.add_prior(dependent, prior))
    }

    pub fn remove_node(&mut self, nid: Nid, cascade: Cascade) -> Result<Node, ManagerError> {
        self.apply(|g| g.remove_node(nid, cascade))
    }

    pub fn remove_edge(&mut self, nid: Nid) -> Result<(), ManagerError> {
        self.apply(|g| g.remove_edge(nid).map(|_| ()))
    }

    /// Applies an import document and persists the result.
    pub fn import(&mut self, doc: &ImportDocument) -> Result<ImportReport, ManagerError> {
        self.apply(|g| doc.apply(g))
    }
}

/// Errors that can occur in GraphManager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}
