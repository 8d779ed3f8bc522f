//! Node creation and the Metatype / Nodetype parent trees.

use regex::Regex;
use std::collections::HashSet;
use std::mem;
use std::sync::LazyLock;
use tracing::debug;

use super::{Element, Graph, GraphError, Result, SlugScope};
use crate::ontology::{
    Edge, EdgeKind, Gbobject, Metatype, NewNode, Nid, Node, NodeKind, Nodetype,
    ObjectSpecialization, Status, TypeSpecialization,
};

// =============================================================================
// KIND PREDICATES
// =============================================================================

pub(crate) fn is_metatype(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Metatype(_))
}

pub(crate) fn is_nodetype(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Nodetype(_))
}

pub(crate) fn is_gbobject(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Gbobject(_))
}

pub(crate) fn is_relationtype(node: &Node) -> bool {
    node.as_relationtype().is_some()
}

pub(crate) fn is_attributetype(node: &Node) -> bool {
    node.as_attributetype().is_some()
}

fn is_processtype(node: &Node) -> bool {
    matches!(
        node.as_nodetype().map(|n| &n.specialization),
        Some(TypeSpecialization::Processtype(_))
    )
}

fn is_systemtype(node: &Node) -> bool {
    matches!(
        node.as_nodetype().map(|n| &n.specialization),
        Some(TypeSpecialization::Systemtype(_))
    )
}

fn is_process(node: &Node) -> bool {
    matches!(
        node.as_gbobject().map(|g| &g.specialization),
        Some(ObjectSpecialization::Process(_))
    )
}

fn is_system(node: &Node) -> bool {
    matches!(
        node.as_gbobject().map(|g| &g.specialization),
        Some(ObjectSpecialization::System(_))
    )
}

fn is_relation(edge: &Edge) -> bool {
    matches!(edge.kind, EdgeKind::Relation(_))
}

fn is_attribute(edge: &Edge) -> bool {
    matches!(edge.kind, EdgeKind::Attribute(_))
}

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("slug pattern"));

fn valid_slug(slug: &str) -> bool {
    SLUG.is_match(slug)
}

impl Graph {
    // =========================================================================
    // Creation
    // =========================================================================

    /// Validates and inserts a node, returning its freshly allocated Nid.
    pub fn create_node(&mut self, new: NewNode) -> Result<Nid> {
        let nid = Nid(self.last_nid + 1);
        let node = new.into_node(nid);
        self.validate_node(&node)?;

        self.last_nid = nid.get();
        debug!(%nid, kind = node.kind.type_name(), title = %node.title, "created node");
        self.nodes.insert(nid, node);
        Ok(nid)
    }

    pub fn create_metatype(&mut self, title: impl Into<String>, metatype: Metatype) -> Result<Nid> {
        self.create_node(NewNode::new(title, metatype))
    }

    pub fn create_nodetype(&mut self, title: impl Into<String>, nodetype: Nodetype) -> Result<Nid> {
        self.create_node(NewNode::new(title, nodetype))
    }

    pub fn create_gbobject(&mut self, title: impl Into<String>, gbobject: Gbobject) -> Result<Nid> {
        self.create_node(NewNode::new(title, gbobject))
    }

    /// Applies `edit` to a copy of the node and stores it if it still
    /// satisfies every invariant. The node's kind cannot change.
    pub fn update_node<F>(&mut self, nid: Nid, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Node),
    {
        let current = self.node(nid)?;
        let mut updated = current.clone();
        edit(&mut updated);
        updated.nid = nid;

        if updated.kind.type_name() != current.kind.type_name()
            || mem::discriminant(&updated.kind) != mem::discriminant(&current.kind)
        {
            return Err(GraphError::Invalid(format!(
                "cannot change {} from {} to {}",
                nid,
                current.kind.type_name(),
                updated.kind.type_name()
            )));
        }

        if let (Some(old), Some(new)) = (current.publication(), updated.publication()) {
            if old.status == Status::Hidden && new.status != Status::Hidden {
                return Err(GraphError::InvalidTransition {
                    nid,
                    from: old.status,
                    to: new.status,
                });
            }
        }

        if let (Some(old), Some(new)) = (current.as_attributetype(), updated.as_attributetype()) {
            if old.data_type != new.data_type && self.edges_of_attributetype(nid).next().is_some()
            {
                return Err(GraphError::Invalid(format!(
                    "cannot change data type of attributetype {} while attributes use it",
                    nid
                )));
            }
        }

        self.validate_node(&updated)?;
        debug!(%nid, "updated node");
        self.nodes.insert(nid, updated);
        Ok(())
    }

    /// Re-parents a Metatype or Nodetype, rejecting cycles.
    pub fn set_parent(&mut self, nid: Nid, parent: Option<Nid>) -> Result<()> {
        let node = self.node(nid)?;
        if !node.is_tree_node() {
            return Err(GraphError::WrongKind {
                nid,
                expected: "Metatype or Nodetype",
                actual: node.kind.type_name(),
            });
        }
        self.update_node(nid, |node| match &mut node.kind {
            NodeKind::Metatype(m) => m.parent = parent,
            NodeKind::Nodetype(n) => n.parent = parent,
            _ => {}
        })
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Resolves `nid` to a node accepted by `accept`.
    pub(crate) fn expect_node(
        &self,
        nid: Nid,
        expected: &'static str,
        accept: impl Fn(&Node) -> bool,
    ) -> Result<&Node> {
        match self.resolve(nid) {
            Some(Element::Node(node)) if accept(node) => Ok(node),
            Some(other) => Err(GraphError::WrongKind {
                nid,
                expected,
                actual: other.type_name(),
            }),
            None => Err(GraphError::NotFound(nid)),
        }
    }

    /// Resolves `nid` to an edge accepted by `accept`.
    pub(crate) fn expect_edge(
        &self,
        nid: Nid,
        expected: &'static str,
        accept: impl Fn(&Edge) -> bool,
    ) -> Result<&Edge> {
        match self.resolve(nid) {
            Some(Element::Edge(edge)) if accept(edge) => Ok(edge),
            Some(other) => Err(GraphError::WrongKind {
                nid,
                expected,
                actual: other.type_name(),
            }),
            None => Err(GraphError::NotFound(nid)),
        }
    }

    fn expect_all(
        &self,
        nids: &[Nid],
        expected: &'static str,
        accept: impl Fn(&Node) -> bool,
    ) -> Result<()> {
        for nid in nids {
            self.expect_node(*nid, expected, &accept)?;
        }
        Ok(())
    }

    fn expect_all_edges(
        &self,
        nids: &[Nid],
        expected: &'static str,
        accept: impl Fn(&Edge) -> bool,
    ) -> Result<()> {
        for nid in nids {
            self.expect_edge(*nid, expected, &accept)?;
        }
        Ok(())
    }

    fn expect_exists(&self, nids: &[Nid]) -> Result<()> {
        match nids.iter().find(|nid| !self.contains(**nid)) {
            Some(missing) => Err(GraphError::NotFound(*missing)),
            None => Ok(()),
        }
    }

    fn validate_node(&self, node: &Node) -> Result<()> {
        if node.title.trim().is_empty() {
            return Err(GraphError::Invalid("title must not be empty".into()));
        }
        if let Some(slug) = node.slug() {
            if !valid_slug(slug) {
                return Err(GraphError::InvalidSlug(slug.to_string()));
            }
        }
        self.check_slug_unique(node)?;

        match &node.kind {
            NodeKind::Metatype(m) => {
                if let Some(parent) = m.parent {
                    self.check_parent(node.nid, parent, "Metatype", is_metatype)?;
                }
            }
            NodeKind::Nodetype(n) => {
                if let Some(parent) = n.parent {
                    self.check_parent(node.nid, parent, "Nodetype", is_nodetype)?;
                }
                self.expect_all(&n.metatypes, "Metatype", is_metatype)?;
                self.expect_all(&n.related, "Nodetype", is_nodetype)?;
                self.check_authors(node.nid, &n.authors)?;
                self.validate_specialization(&n.specialization)?;
            }
            NodeKind::Gbobject(g) => {
                self.expect_all(&g.objecttypes, "Nodetype", is_nodetype)?;
                self.expect_all(&g.related, "Gbobject", is_gbobject)?;
                self.check_authors(node.nid, &g.authors)?;
                self.validate_object_specialization(node.nid, &g.specialization)?;
            }
            NodeKind::AttributeSpecification(s) => {
                self.expect_node(s.attributetype, "Attributetype", is_attributetype)?;
                self.expect_exists(&s.subjects)?;
            }
            NodeKind::RelationSpecification(s) => {
                self.expect_node(s.relationtype, "Relationtype", is_relationtype)?;
                self.expect_exists(&s.subjects)?;
            }
            NodeKind::NodeSpecification(s) => {
                self.expect_node(s.subject, "Node", |_| true)?;
                self.expect_all_edges(&s.relations, "Relation", is_relation)?;
                self.expect_all_edges(&s.attributes, "Attribute", is_attribute)?;
            }
            NodeKind::Union(s) | NodeKind::Complement(s) | NodeKind::Intersection(s) => {
                self.expect_all(&s.nodetypes, "Nodetype", is_nodetype)?;
            }
        }
        Ok(())
    }

    fn validate_specialization(&self, specialization: &TypeSpecialization) -> Result<()> {
        match specialization {
            TypeSpecialization::Plain | TypeSpecialization::Objecttype => {}
            TypeSpecialization::Relationtype(rt) => {
                if rt.inverse.trim().is_empty() {
                    return Err(GraphError::Invalid("relationtype inverse must not be empty".into()));
                }
                self.expect_exists(&[rt.left_subjecttype, rt.right_subjecttype])?;
            }
            TypeSpecialization::Attributetype(at) => {
                self.expect_exists(&[at.subjecttype])?;
                self.expect_all(&at.validators, "Attributetype", is_attributetype)?;
            }
            TypeSpecialization::Processtype(pt) => {
                self.expect_all(&pt.changing_attributetypes, "Attributetype", is_attributetype)?;
                self.expect_all(&pt.changing_relationtypes, "Relationtype", is_relationtype)?;
            }
            TypeSpecialization::Systemtype(st) => {
                self.expect_all(&st.nodetypes, "Nodetype", is_nodetype)?;
                self.expect_all(&st.relationtypes, "Relationtype", is_relationtype)?;
                self.expect_all(&st.attributetypes, "Attributetype", is_attributetype)?;
                self.expect_all(&st.metatypes, "Metatype", is_metatype)?;
                self.expect_all(&st.processtypes, "Processtype", is_processtype)?;
            }
        }
        Ok(())
    }

    fn validate_object_specialization(
        &self,
        nid: Nid,
        specialization: &ObjectSpecialization,
    ) -> Result<()> {
        match specialization {
            ObjectSpecialization::Plain => {}
            ObjectSpecialization::Process(p) => {
                self.expect_all(&p.processtypes, "Processtype", is_processtype)?;
                self.expect_all_edges(&p.priorstate_attributes, "Attribute", is_attribute)?;
                self.expect_all_edges(&p.poststate_attributes, "Attribute", is_attribute)?;
                self.expect_all_edges(&p.priorstate_relations, "Relation", is_relation)?;
                self.expect_all_edges(&p.poststate_relations, "Relation", is_relation)?;
            }
            ObjectSpecialization::System(s) => {
                if s.systems.contains(&nid) {
                    return Err(GraphError::Invalid(format!("system {} cannot contain itself", nid)));
                }
                self.expect_all(&s.systemtypes, "Systemtype", is_systemtype)?;
                self.expect_all(&s.gbobjects, "Gbobject", is_gbobject)?;
                self.expect_all_edges(&s.relations, "Relation", is_relation)?;
                self.expect_all_edges(&s.attributes, "Attribute", is_attribute)?;
                self.expect_all(&s.processes, "Process", is_process)?;
                self.expect_all(&s.systems, "System", is_system)?;
            }
        }
        Ok(())
    }

    fn check_authors(&self, nid: Nid, authors: &[String]) -> Result<()> {
        if self.config.require_authors && authors.iter().all(|a| a.trim().is_empty()) {
            return Err(GraphError::Invalid(format!("{} needs at least one author", nid)));
        }
        Ok(())
    }

    fn check_slug_unique(&self, node: &Node) -> Result<()> {
        let clash = |other: &Node| other.nid != node.nid && other.slug() == node.slug();

        match &node.kind {
            NodeKind::Metatype(m) => {
                if self.nodes.values().any(|o| is_metatype(o) && clash(o)) {
                    return Err(GraphError::DuplicateSlug {
                        slug: m.slug.clone(),
                        scope: SlugScope::Metatypes,
                    });
                }
            }
            NodeKind::Nodetype(n) => {
                let day = n.publication.creation_date.date_naive();
                let taken = self.nodes.values().any(|o| {
                    clash(o)
                        && o.as_nodetype()
                            .is_some_and(|other| other.publication.creation_date.date_naive() == day)
                });
                if taken {
                    return Err(GraphError::DuplicateSlug {
                        slug: n.slug.clone(),
                        scope: SlugScope::NodetypesOn(day),
                    });
                }
            }
            NodeKind::Gbobject(g) => {
                let day = g.publication.creation_date.date_naive();
                let taken = self.nodes.values().any(|o| {
                    clash(o)
                        && o.as_gbobject()
                            .is_some_and(|other| other.publication.creation_date.date_naive() == day)
                });
                if taken {
                    return Err(GraphError::DuplicateSlug {
                        slug: g.slug.clone(),
                        scope: SlugScope::ObjectsOn(day),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check_parent(
        &self,
        nid: Nid,
        parent: Nid,
        expected: &'static str,
        accept: fn(&Node) -> bool,
    ) -> Result<()> {
        if parent == nid {
            return Err(GraphError::Cycle {
                chain: vec![nid, nid],
            });
        }
        self.expect_node(parent, expected, accept)?;
        self.check_no_cycle(nid, parent)
    }

    /// Walks up from `parent`; reaching `nid` means the assignment would
    /// close a loop.
    fn check_no_cycle(&self, nid: Nid, parent: Nid) -> Result<()> {
        let mut chain = vec![nid];
        let mut visited = HashSet::new();
        let mut current = Some(parent);

        while let Some(cursor) = current {
            chain.push(cursor);
            if cursor == nid || !visited.insert(cursor) {
                return Err(GraphError::Cycle { chain });
            }
            current = self.nodes.get(&cursor).and_then(|n| n.parent());
        }
        Ok(())
    }

    // =========================================================================
    // Tree queries
    // =========================================================================

    /// Parent chain of a node, nearest first.
    pub fn ancestors(&self, nid: Nid) -> Result<Vec<Nid>> {
        let mut chain = vec![nid];
        let mut visited = HashSet::from([nid]);
        let mut ancestors = Vec::new();
        let mut current = self.node(nid)?.parent();

        while let Some(cursor) = current {
            chain.push(cursor);
            if !visited.insert(cursor) {
                return Err(GraphError::Cycle { chain });
            }
            ancestors.push(cursor);
            current = self.node(cursor)?.parent();
        }
        Ok(ancestors)
    }

    /// Immediate children, i.e. nodes whose parent is `nid`.
    pub fn children(&self, nid: Nid) -> Vec<Nid> {
        self.nodes
            .values()
            .filter(|n| n.parent() == Some(nid))
            .map(|n| n.nid)
            .collect()
    }

    /// Other nodes sharing this node's parent. Roots have no siblings.
    pub fn siblings(&self, nid: Nid) -> Result<Vec<Nid>> {
        let Some(parent) = self.node(nid)?.parent() else {
            return Ok(Vec::new());
        };
        Ok(self
            .children(parent)
            .into_iter()
            .filter(|n| *n != nid)
            .collect())
    }

    /// Ancestor slugs from the root down to `nid`, joined by `/`.
    pub fn tree_path(&self, nid: Nid) -> Result<String> {
        let mut slugs = Vec::new();
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(nid);

        while let Some(cursor) = current {
            chain.push(cursor);
            if !visited.insert(cursor) {
                return Err(GraphError::Cycle { chain });
            }
            let node = self.node(cursor)?;
            let slug = node.slug().ok_or(GraphError::WrongKind {
                nid: cursor,
                expected: "node with a slug",
                actual: node.kind.type_name(),
            })?;
            slugs.push(slug);
            current = node.parent();
        }

        slugs.reverse();
        Ok(slugs.join("/"))
    }

    /// Tree path of the parent, if any.
    pub fn subtypeof(&self, nid: Nid) -> Result<Option<String>> {
        match self.node(nid)?.parent() {
            Some(parent) => Ok(Some(self.tree_path(parent)?)),
            None => Ok(None),
        }
    }

    /// Natural-language triple describing where the node sits.
    ///
    /// Metatypes read "{title} is a kind of {path}" or "{slug} is a root
    /// node"; Nodetypes read "{title} is a subtype of {path}" or "{title} is a
    /// root node"; objects describe their membership; specifications render
    /// their composed subject.
    pub fn composed_sentence(&self, nid: Nid) -> Result<String> {
        let node = self.node(nid)?;
        match &node.kind {
            NodeKind::Metatype(m) => match m.parent {
                Some(parent) => Ok(format!(
                    "{} is a kind of {}",
                    node.title,
                    self.tree_path(parent)?
                )),
                None => Ok(format!("{} is a root node", m.slug)),
            },
            NodeKind::Nodetype(_) => match self.subtypeof(nid)? {
                Some(path) => Ok(format!("{} is a subtype of {}", node.title, path)),
                None => Ok(format!("{} is a root node", node.title)),
            },
            NodeKind::Gbobject(_) => self.memberof_sentence(nid),
            _ => self.composed_subject(nid),
        }
    }

    /// "{title} is a kind of {path}" or "{title} is a root node".
    pub fn tree_path_sentence(&self, nid: Nid) -> Result<String> {
        let node = self.node(nid)?;
        match node.parent() {
            Some(parent) => Ok(format!(
                "{} is a kind of {}",
                node.title,
                self.tree_path(parent)?
            )),
            None => Ok(format!("{} is a root node", node.title)),
        }
    }

    /// Names the first metatype (or objecttype, for objects) of a node.
    pub fn memberof_sentence(&self, nid: Nid) -> Result<String> {
        let node = self.node(nid)?;
        let (group, members) = match &node.kind {
            NodeKind::Nodetype(n) => ("metatype", &n.metatypes),
            NodeKind::Gbobject(g) => ("objecttype", &g.objecttypes),
            _ => {
                return Err(GraphError::WrongKind {
                    nid,
                    expected: "Nodetype or Gbobject",
                    actual: node.kind.type_name(),
                })
            }
        };

        match members.iter().find_map(|m| self.title_of(*m)) {
            Some(first) => Ok(format!("{} is a member of {} {}", node.title, group, first)),
            None => Ok(format!(
                "{} is not a fully defined name, consider making it a member of a suitable {}",
                node.title, group
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{Nodetype, RelationtypeSpec};

    #[test]
    fn test_invalid_slug_rejected() {
        let mut graph = Graph::new();
        let err = graph
            .create_metatype("Bad", Metatype::new("has space"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidSlug(_)));
    }

    #[test]
    fn test_parent_must_be_same_family() {
        let mut graph = Graph::new();
        let nt = graph.create_nodetype("Car", Nodetype::new("car")).unwrap();
        let err = graph
            .create_metatype("Vehicle", Metatype::new("vehicle").with_parent(nt))
            .unwrap_err();
        assert!(matches!(err, GraphError::WrongKind { expected: "Metatype", .. }));
    }

    #[test]
    fn test_kind_cannot_change_on_update() {
        let mut graph = Graph::new();
        let thing = graph.create_nodetype("Thing", Nodetype::objecttype("thing")).unwrap();
        let err = graph
            .update_node(thing, |node| {
                if let NodeKind::Nodetype(n) = &mut node.kind {
                    n.specialization = TypeSpecialization::Relationtype(RelationtypeSpec::new(
                        "x", thing, thing,
                    ));
                }
            })
            .unwrap_err();
        assert!(matches!(err, GraphError::Invalid(_)));
    }

    #[test]
    fn test_memberof_sentence() {
        let mut graph = Graph::new();
        let concept = graph.create_metatype("Concept", Metatype::new("concept")).unwrap();
        let car = graph
            .create_nodetype("Car", Nodetype::new("car").with_metatypes([concept]))
            .unwrap();
        let bike = graph.create_nodetype("Bike", Nodetype::new("bike")).unwrap();

        assert_eq!(
            graph.memberof_sentence(car).unwrap(),
            "Car is a member of metatype Concept"
        );
        assert_eq!(
            graph.memberof_sentence(bike).unwrap(),
            "Bike is not a fully defined name, consider making it a member of a suitable metatype"
        );
    }

    #[test]
    fn test_siblings_and_children() {
        let mut graph = Graph::new();
        let root = graph.create_metatype("Root", Metatype::new("root")).unwrap();
        let a = graph
            .create_metatype("A", Metatype::new("a").with_parent(root))
            .unwrap();
        let b = graph
            .create_metatype("B", Metatype::new("b").with_parent(root))
            .unwrap();

        assert_eq!(graph.children(root), vec![a, b]);
        assert_eq!(graph.siblings(a).unwrap(), vec![b]);
        assert!(graph.siblings(root).unwrap().is_empty());
        assert_eq!(graph.ancestors(b).unwrap(), vec![root]);
    }
}
