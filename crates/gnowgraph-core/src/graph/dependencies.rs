//! Prior / posterior links between publishable nodes.
//!
//! One directed table holds `dependent depends_on prior`. The prior view
//! and the posterior view are both queries over it, so they cannot drift.

use tracing::debug;

use super::{Dependency, Graph, GraphError, Result};
use crate::ontology::{Nid, Node, NodeKind};

fn family(node: &Node) -> Option<&'static str> {
    match node.kind {
        NodeKind::Nodetype(_) => Some("Nodetype"),
        NodeKind::Gbobject(_) => Some("Gbobject"),
        _ => None,
    }
}

impl Graph {
    /// Records that `dependent` has `prior` among its prior nodes.
    ///
    /// Both ends must be of the same family (Nodetype or Gbobject).
    /// Returns `false` when the link already existed.
    pub fn add_prior(&mut self, dependent: Nid, prior: Nid) -> Result<bool> {
        if dependent == prior {
            return Err(GraphError::Invalid(format!("{} cannot be its own prior node", dependent)));
        }
        let dependent_family = self.dependency_family(dependent)?;
        let prior_family = self.dependency_family(prior)?;
        if dependent_family != prior_family {
            return Err(GraphError::WrongKind {
                nid: prior,
                expected: dependent_family,
                actual: prior_family,
            });
        }

        let inserted = self.dependencies.insert(Dependency { dependent, prior });
        if inserted {
            debug!(%dependent, %prior, "added prior node");
        }
        Ok(inserted)
    }

    /// Records that `dependent` has `posterior` among its posterior nodes.
    pub fn add_posterior(&mut self, node: Nid, posterior: Nid) -> Result<bool> {
        self.add_prior(posterior, node)
    }

    /// Removes a prior link. Returns `false` when there was none.
    pub fn remove_prior(&mut self, dependent: Nid, prior: Nid) -> bool {
        self.dependencies.remove(&Dependency { dependent, prior })
    }

    /// Replaces the whole prior set of `dependent` atomically.
    pub fn set_prior_nodes(&mut self, dependent: Nid, priors: &[Nid]) -> Result<()> {
        self.transaction(|tx| {
            tx.dependencies.retain(|d| d.dependent != dependent);
            for prior in priors {
                tx.add_prior(dependent, *prior)?;
            }
            Ok(())
        })
    }

    /// Nodes `nid` depends on.
    pub fn prior_nodes(&self, nid: Nid) -> Vec<Nid> {
        self.dependencies
            .iter()
            .filter(|d| d.dependent == nid)
            .map(|d| d.prior)
            .collect()
    }

    /// Nodes that depend on `nid`.
    pub fn posterior_nodes(&self, nid: Nid) -> Vec<Nid> {
        self.dependencies
            .iter()
            .filter(|d| d.prior == nid)
            .map(|d| d.dependent)
            .collect()
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter()
    }

    fn dependency_family(&self, nid: Nid) -> Result<&'static str> {
        let node = self.expect_node(nid, "Nodetype or Gbobject", |n| family(n).is_some())?;
        family(node).ok_or(GraphError::NotFound(nid))
    }
}
