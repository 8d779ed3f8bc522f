//! Relation and Attribute instances: creation, queries, sentences, removal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::hierarchy::{is_attributetype, is_relationtype};
use super::{Graph, GraphError, Result};
use crate::ontology::datatype::ValueError;
use crate::ontology::{
    Attribute, AttributeScopes, AttributeValue, AttributetypeSpec, Edge, EdgeKind, Nid, Node,
    NodeClass, NodeKind, Relation, RelationScopes, RelationtypeSpec, MAX_SCOPE_LEN,
};

/// How node removal treats edges that still bind the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cascade {
    /// Refuse to remove a node that edges still reference.
    #[default]
    Restrict,
    /// Remove the referencing edges along with the node.
    Edges,
}

/// Relations touching a subject, grouped by direction.
///
/// Outgoing relations are keyed by relationtype title, incoming ones by the
/// relationtype's inverse name. Values are relation edge Nids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationsOf {
    pub left: BTreeMap<String, Vec<Nid>>,
    pub right: BTreeMap<String, Vec<Nid>>,
}

impl RelationsOf {
    /// Both directions in one map. When a title and an inverse name
    /// coincide, the lists are concatenated.
    pub fn merged(&self) -> BTreeMap<String, Vec<Nid>> {
        let mut merged = self.left.clone();
        for (key, nids) in &self.right {
            merged.entry(key.clone()).or_default().extend(nids);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

fn check_scopes(scopes: [Option<&String>; 3]) -> Result<()> {
    for scope in scopes.into_iter().flatten() {
        if scope.chars().count() > MAX_SCOPE_LEN {
            return Err(GraphError::Invalid(format!(
                "scope '{}' exceeds {} characters",
                scope, MAX_SCOPE_LEN
            )));
        }
    }
    Ok(())
}

fn slot(scope: Option<&str>) -> &str {
    scope.unwrap_or("")
}

impl Graph {
    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates `left --relationtype--> right`.
    ///
    /// Fails with [`GraphError::DuplicateEdge`] when the same 6-tuple is
    /// already stored.
    pub fn create_relation(
        &mut self,
        left: Nid,
        relationtype: Nid,
        right: Nid,
        scopes: RelationScopes,
    ) -> Result<Nid> {
        check_scopes([
            scopes.left.as_ref(),
            scopes.relationtype.as_ref(),
            scopes.right.as_ref(),
        ])?;
        let spec = self
            .expect_node(relationtype, "Relationtype", is_relationtype)?
            .as_relationtype()
            .cloned()
            .ok_or(GraphError::NotFound(relationtype))?;
        for subject in [left, right] {
            if !self.contains(subject) {
                return Err(GraphError::NotFound(subject));
            }
        }
        if self.config.enforce_subject_types {
            self.check_relation_domain(&spec, left, right)?;
        }

        let relation = Relation::new(left, relationtype, right).with_scopes(scopes);
        let title = self.relation_title(&relation);
        self.insert_edge(title, EdgeKind::Relation(relation))
    }

    /// Attaches a typed value to `subject` through `attributetype`.
    ///
    /// The value must match the attributetype's data type. Fails with
    /// [`GraphError::DuplicateEdge`] when the same 6-tuple is already stored.
    pub fn create_attribute(
        &mut self,
        subject: Nid,
        attributetype: Nid,
        value: AttributeValue,
        scopes: AttributeScopes,
    ) -> Result<Nid> {
        check_scopes([
            scopes.subject.as_ref(),
            scopes.attributetype.as_ref(),
            scopes.value.as_ref(),
        ])?;
        let spec = self
            .expect_node(attributetype, "Attributetype", is_attributetype)?
            .as_attributetype()
            .cloned()
            .ok_or(GraphError::NotFound(attributetype))?;
        if !self.contains(subject) {
            return Err(GraphError::NotFound(subject));
        }
        self.check_value(attributetype, &spec, &value)?;
        if self.config.enforce_subject_types
            && !self.conforms_to(subject, spec.subjecttype, spec.applicable)
        {
            return Err(GraphError::Invalid(format!(
                "{} is not a {} and cannot carry attributetype {}",
                subject,
                self.title_of(spec.subjecttype).unwrap_or("?"),
                attributetype
            )));
        }

        let attribute = Attribute::new(subject, attributetype, value).with_scopes(scopes);
        let title = self.attribute_title(&attribute);
        self.insert_edge(title, EdgeKind::Attribute(attribute))
    }

    /// Parses `raw` with the attributetype's data type, then creates the
    /// attribute.
    pub fn create_attribute_from_str(
        &mut self,
        subject: Nid,
        attributetype: Nid,
        raw: &str,
        scopes: AttributeScopes,
    ) -> Result<Nid> {
        let data_type = self
            .expect_node(attributetype, "Attributetype", is_attributetype)?
            .as_attributetype()
            .map(|spec| spec.data_type)
            .ok_or(GraphError::NotFound(attributetype))?;
        let value = AttributeValue::parse(data_type, raw).map_err(|source| {
            GraphError::InvalidValue {
                attributetype,
                source,
            }
        })?;
        self.create_attribute(subject, attributetype, value, scopes)
    }

    /// Single insert path for edges. The uniqueness index is checked and
    /// updated here, so no caller can bypass it.
    fn insert_edge(&mut self, title: String, kind: EdgeKind) -> Result<Nid> {
        let nid = Nid(self.last_nid + 1);
        let edge = Edge { nid, title, kind };
        self.index_edge(&edge)?;

        self.last_nid = nid.get();
        debug!(%nid, title = %edge.title, "created edge");
        self.edges.insert(nid, edge);
        Ok(nid)
    }

    fn check_value(
        &self,
        attributetype: Nid,
        spec: &AttributetypeSpec,
        value: &AttributeValue,
    ) -> Result<()> {
        let invalid = |source| GraphError::InvalidValue {
            attributetype,
            source,
        };
        if value.data_type() != spec.data_type {
            return Err(invalid(ValueError::Mismatch {
                expected: spec.data_type,
                actual: value.data_type(),
            }));
        }
        value.validate().map_err(invalid)?;
        value
            .check_field_config(spec.max_digits, spec.decimal_places, spec.min_length)
            .map_err(invalid)?;

        if spec.unique == Some(true) {
            let svalue = value.svalue();
            let taken = self
                .edges_of_attributetype(attributetype)
                .filter_map(|e| e.as_attribute())
                .any(|a| a.svalue() == svalue);
            if taken {
                return Err(invalid(ValueError::Constraint(format!(
                    "value '{}' is already used and must be unique",
                    svalue
                ))));
            }
        }

        for validator in &spec.validators {
            let Some(other) = self.get_node(*validator).and_then(Node::as_attributetype) else {
                continue;
            };
            value
                .check_field_config(other.max_digits, other.decimal_places, other.min_length)
                .map_err(invalid)?;
        }
        Ok(())
    }

    fn check_relation_domain(&self, spec: &RelationtypeSpec, left: Nid, right: Nid) -> Result<()> {
        let sides = [
            (left, spec.left_subjecttype, spec.left_applicable, "left"),
            (right, spec.right_subjecttype, spec.right_applicable, "right"),
        ];
        for (subject, subjecttype, applicable, side) in sides {
            if !self.conforms_to(subject, subjecttype, applicable) {
                return Err(GraphError::Invalid(format!(
                    "{} subject {} is not a {}",
                    side,
                    subject,
                    self.title_of(subjecttype).unwrap_or("?")
                )));
            }
        }
        Ok(())
    }

    /// Whether `subject` is `subjecttype`, a subtype of it, or a member of
    /// it (or of one of its subtypes). When the subject type is a node class
    /// marker such as "any Relation", the subject's class decides.
    pub(crate) fn conforms_to(&self, subject: Nid, subjecttype: Nid, applicable: NodeClass) -> bool {
        if subject == subjecttype {
            return true;
        }
        if let Some(edge) = self.get_edge(subject) {
            return edge.class() == applicable || applicable == NodeClass::Edge;
        }
        let Some(node) = self.get_node(subject) else {
            return false;
        };

        let is_type_or_subtype = |candidate: Nid| {
            candidate == subjecttype
                || self
                    .ancestors(candidate)
                    .map(|chain| chain.contains(&subjecttype))
                    .unwrap_or(false)
        };

        match &node.kind {
            NodeKind::Gbobject(g) => g.objecttypes.iter().any(|ot| is_type_or_subtype(*ot)),
            NodeKind::Nodetype(n) => {
                is_type_or_subtype(subject) || n.metatypes.iter().any(|mt| is_type_or_subtype(*mt))
            }
            NodeKind::Metatype(_) => is_type_or_subtype(subject),
            _ => node.class() == applicable || applicable == NodeClass::Node,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Relation edges where `nid` is the left or right subject.
    pub fn relation_edges(&self, nid: Nid) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| {
            e.as_relation()
                .is_some_and(|r| r.left_subject == nid || r.right_subject == nid)
        })
    }

    /// Attribute edges whose subject is `nid`.
    pub fn attribute_edges(&self, nid: Nid) -> impl Iterator<Item = &Edge> {
        self.edges
            .values()
            .filter(move |e| e.as_attribute().is_some_and(|a| a.subject == nid))
    }

    pub(crate) fn edges_of_attributetype(&self, nid: Nid) -> impl Iterator<Item = &Edge> {
        self.edges
            .values()
            .filter(move |e| e.as_attribute().is_some_and(|a| a.attributetype == nid))
    }

    /// Name/value view of a subject's attributes.
    ///
    /// Keys are `"{attributetype scope}{attributetype title}"`, values
    /// `"{value scope}{svalue}"`. Absent scopes contribute nothing.
    pub fn attributes_of(&self, subject: Nid) -> BTreeMap<String, String> {
        self.attribute_edges(subject)
            .filter_map(|e| e.as_attribute())
            .map(|a| self.edge_node_dict(a))
            .collect()
    }

    /// The single name/value pair of an attribute.
    pub fn edge_node_dict(&self, attribute: &Attribute) -> (String, String) {
        let at_title = self.title_of(attribute.attributetype).unwrap_or_default();
        (
            format!("{}{}", slot(attribute.attributetype_scope.as_deref()), at_title),
            format!("{}{}", slot(attribute.value_scope.as_deref()), attribute.svalue()),
        )
    }

    /// Relations of a subject, partitioned into outgoing and incoming.
    pub fn relations_of(&self, subject: Nid) -> RelationsOf {
        let mut out = RelationsOf::default();
        for edge in self.relation_edges(subject) {
            let Some(relation) = edge.as_relation() else {
                continue;
            };
            let Some(rt_node) = self.get_node(relation.relationtype) else {
                continue;
            };
            if relation.left_subject == subject {
                out.left.entry(rt_node.title.clone()).or_default().push(edge.nid);
            }
            if relation.right_subject == subject {
                let inverse = rt_node
                    .as_relationtype()
                    .map(|rt| rt.inverse.clone())
                    .unwrap_or_else(|| rt_node.title.clone());
                out.right.entry(inverse).or_default().push(edge.nid);
            }
        }
        out
    }

    /// Relationtypes whose left subject type is `nid`.
    pub fn left_subjecttype_of(&self, nid: Nid) -> Vec<Nid> {
        self.nodes
            .values()
            .filter(|n| n.as_relationtype().is_some_and(|rt| rt.left_subjecttype == nid))
            .map(|n| n.nid)
            .collect()
    }

    /// Relationtypes whose right subject type is `nid`.
    pub fn right_subjecttype_of(&self, nid: Nid) -> Vec<Nid> {
        self.nodes
            .values()
            .filter(|n| n.as_relationtype().is_some_and(|rt| rt.right_subjecttype == nid))
            .map(|n| n.nid)
            .collect()
    }

    /// Attributetypes whose subject type is `nid`.
    pub fn attributetypes_of(&self, nid: Nid) -> Vec<Nid> {
        self.nodes
            .values()
            .filter(|n| n.as_attributetype().is_some_and(|at| at.subjecttype == nid))
            .map(|n| n.nid)
            .collect()
    }

    /// Relations attached to any ancestor of `nid`, split by the side the
    /// ancestor occupies.
    pub fn possible_relations(&self, nid: Nid) -> Result<RelationsOf> {
        let mut out = RelationsOf::default();
        for ancestor in self.ancestors(nid)? {
            let found = self.relations_of(ancestor);
            for (key, nids) in found.left {
                out.left.entry(key).or_default().extend(nids);
            }
            for (key, nids) in found.right {
                out.right.entry(key).or_default().extend(nids);
            }
        }
        Ok(out)
    }

    /// Attribute edges attached to any ancestor of `nid`.
    pub fn possible_attributes(&self, nid: Nid) -> Result<Vec<Nid>> {
        let mut out = Vec::new();
        for ancestor in self.ancestors(nid)? {
            out.extend(self.attribute_edges(ancestor).map(|e| e.nid));
        }
        Ok(out)
    }

    // =========================================================================
    // Sentences
    // =========================================================================

    fn relation(&self, nid: Nid) -> Result<&Relation> {
        self.expect_edge(nid, "Relation", |e| e.as_relation().is_some())?
            .as_relation()
            .ok_or(GraphError::NotFound(nid))
    }

    fn attribute(&self, nid: Nid) -> Result<&Attribute> {
        self.expect_edge(nid, "Attribute", |e| e.as_attribute().is_some())?
            .as_attribute()
            .ok_or(GraphError::NotFound(nid))
    }

    fn inverse_name(&self, relationtype: Nid) -> &str {
        self.get_node(relationtype)
            .and_then(|n| n.as_relationtype())
            .map(|rt| rt.inverse.as_str())
            .unwrap_or_default()
    }

    fn relation_title(&self, relation: &Relation) -> String {
        format!(
            "{} {} {}",
            self.title_of(relation.left_subject).unwrap_or_default(),
            self.title_of(relation.relationtype).unwrap_or_default(),
            self.title_of(relation.right_subject).unwrap_or_default()
        )
    }

    fn attribute_title(&self, attribute: &Attribute) -> String {
        format!(
            "the {} of {} is {}",
            self.title_of(attribute.attributetype).unwrap_or_default(),
            self.title_of(attribute.subject).unwrap_or_default(),
            attribute.svalue()
        )
    }

    /// Six slots joined by single spaces: left scope, left subject,
    /// relationtype scope, relationtype, right scope, right subject. An
    /// absent scope renders as an empty slot.
    pub fn relation_composed_sentence(&self, nid: Nid) -> Result<String> {
        let r = self.relation(nid)?;
        Ok([
            slot(r.left_scope.as_deref()),
            self.title_of(r.left_subject).unwrap_or_default(),
            slot(r.relationtype_scope.as_deref()),
            self.title_of(r.relationtype).unwrap_or_default(),
            slot(r.right_scope.as_deref()),
            self.title_of(r.right_subject).unwrap_or_default(),
        ]
        .join(" "))
    }

    /// The same fact read from the right subject, through the inverse name:
    /// right scope, right subject, inverse, left scope, left subject.
    pub fn relation_inversed_sentence(&self, nid: Nid) -> Result<String> {
        let r = self.relation(nid)?;
        Ok([
            slot(r.right_scope.as_deref()),
            self.title_of(r.right_subject).unwrap_or_default(),
            self.inverse_name(r.relationtype),
            slot(r.left_scope.as_deref()),
            self.title_of(r.left_subject).unwrap_or_default(),
        ]
        .join(" "))
    }

    /// "{left} {relationtype} {right}" without scopes.
    pub fn relation_sentence(&self, nid: Nid) -> Result<String> {
        let r = self.relation(nid)?;
        Ok(self.relation_title(r))
    }

    /// `{relationtype title: right subject title}`
    pub fn relation_key_value(&self, nid: Nid) -> Result<(String, String)> {
        let r = self.relation(nid)?;
        Ok((
            self.title_of(r.relationtype).unwrap_or_default().to_string(),
            self.title_of(r.right_subject).unwrap_or_default().to_string(),
        ))
    }

    /// `{inverse name: left subject title}`
    pub fn relation_inverse_key_value(&self, nid: Nid) -> Result<(String, String)> {
        let r = self.relation(nid)?;
        Ok((
            self.inverse_name(r.relationtype).to_string(),
            self.title_of(r.left_subject).unwrap_or_default().to_string(),
        ))
    }

    /// "{subject scope} {subject} has {attributetype scope} {attributetype}
    /// {value scope} {svalue}"
    pub fn attribute_composed_sentence(&self, nid: Nid) -> Result<String> {
        let a = self.attribute(nid)?;
        Ok(format!(
            "{} {} has {} {} {} {}",
            slot(a.subject_scope.as_deref()),
            self.title_of(a.subject).unwrap_or_default(),
            slot(a.attributetype_scope.as_deref()),
            self.title_of(a.attributetype).unwrap_or_default(),
            slot(a.value_scope.as_deref()),
            a.svalue()
        ))
    }

    /// "the {attributetype} of {subject} is {svalue}"
    pub fn attribute_composed_attribution(&self, nid: Nid) -> Result<String> {
        let a = self.attribute(nid)?;
        Ok(self.attribute_title(a))
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Nodes and edges that reference `nid`, excluding `nid` itself.
    pub fn referrers(&self, nid: Nid) -> (Vec<Nid>, Vec<Nid>) {
        let nodes = self
            .nodes
            .values()
            .filter(|n| n.nid != nid && n.references().contains(&nid))
            .map(|n| n.nid)
            .collect();
        let edges = self
            .edges
            .values()
            .filter(|e| e.nid != nid && e.references().contains(&nid))
            .map(|e| e.nid)
            .collect();
        (nodes, edges)
    }

    /// Removes an edge that no node or edge refers to.
    pub fn remove_edge(&mut self, nid: Nid) -> Result<Edge> {
        self.edge(nid)?;
        let (nodes, edges) = self.referrers(nid);
        if !nodes.is_empty() || !edges.is_empty() {
            return Err(GraphError::ReferentialIntegrity {
                nid,
                referenced_by: nodes.into_iter().chain(edges).collect(),
            });
        }
        let edge = self.edges.remove(&nid).ok_or(GraphError::NotFound(nid))?;
        self.unindex_edge(&edge);
        debug!(%nid, "removed edge");
        Ok(edge)
    }

    /// Edges that reference `nid` directly or through other edges.
    pub fn dependent_edges(&self, nid: Nid) -> BTreeSet<Nid> {
        let mut found = BTreeSet::new();
        let mut pending = vec![nid];
        while let Some(target) = pending.pop() {
            for edge in self.edges.values() {
                if edge.references().contains(&target) && found.insert(edge.nid) {
                    pending.push(edge.nid);
                }
            }
        }
        found.remove(&nid);
        found
    }

    /// Removes a node.
    ///
    /// Nodes that reference it always block the removal. Edges that bind it
    /// block it under [`Cascade::Restrict`]. Under [`Cascade::Edges`] they are
    /// removed with it, together with every edge that references a removed
    /// edge; a node referencing any of those edges blocks the removal.
    /// Dependencies and discussions of the node go too.
    pub fn remove_node(&mut self, nid: Nid, cascade: Cascade) -> Result<Node> {
        self.transaction(|tx| {
            tx.node(nid)?;
            let (nodes, edges) = tx.referrers(nid);
            if cascade == Cascade::Restrict && !(nodes.is_empty() && edges.is_empty()) {
                return Err(GraphError::ReferentialIntegrity {
                    nid,
                    referenced_by: nodes.into_iter().chain(edges).collect(),
                });
            }

            let doomed = tx.dependent_edges(nid);
            let mut blockers: BTreeSet<Nid> = nodes.into_iter().collect();
            for edge in &doomed {
                blockers.extend(tx.referrers(*edge).0);
            }
            if !blockers.is_empty() {
                return Err(GraphError::ReferentialIntegrity {
                    nid,
                    referenced_by: blockers.into_iter().collect(),
                });
            }

            for edge in doomed {
                if let Some(removed) = tx.edges.remove(&edge) {
                    tx.unindex_edge(&removed);
                    debug!(nid = %edge, "removed edge");
                }
            }
            tx.dependencies
                .retain(|d| d.dependent != nid && d.prior != nid);
            tx.discussions_mut().retain(|d| d.target != nid);

            let node = tx.nodes.remove(&nid).ok_or(GraphError::NotFound(nid))?;
            debug!(%nid, "removed node");
            Ok(node)
        })
    }

    /// Nids of edges bound to `nid`, in ascending order.
    pub fn incident_edges(&self, nid: Nid) -> BTreeSet<Nid> {
        self.edges
            .values()
            .filter(|e| e.references().contains(&nid))
            .map(|e| e.nid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{DataType, Nodetype, NewNode};

    fn setup() -> (Graph, Nid, Nid, Nid) {
        let mut graph = Graph::new();
        let a = graph.create_nodetype("A", Nodetype::objecttype("a")).unwrap();
        let b = graph.create_nodetype("B", Nodetype::objecttype("b")).unwrap();
        let part_of = graph
            .create_node(NewNode::new(
                "partOf",
                Nodetype::relationtype("part-of", RelationtypeSpec::new("hasPart", a, b)),
            ))
            .unwrap();
        (graph, a, b, part_of)
    }

    #[test]
    fn test_scope_length_limit() {
        let (mut graph, a, b, part_of) = setup();
        let err = graph
            .create_relation(a, part_of, b, RelationScopes::none().left("x".repeat(51)))
            .unwrap_err();
        assert!(matches!(err, GraphError::Invalid(_)));
    }

    #[test]
    fn test_relationtype_must_be_relationtype() {
        let (mut graph, a, b, _) = setup();
        let err = graph.create_relation(a, b, a, RelationScopes::none()).unwrap_err();
        assert!(matches!(err, GraphError::WrongKind { expected: "Relationtype", .. }));
    }

    #[test]
    fn test_relations_of_partitions_by_direction() {
        let (mut graph, a, b, part_of) = setup();
        let r = graph.create_relation(a, part_of, b, RelationScopes::none()).unwrap();

        let of_a = graph.relations_of(a);
        assert_eq!(of_a.left.get("partOf"), Some(&vec![r]));
        assert!(of_a.right.is_empty());

        let of_b = graph.relations_of(b);
        assert_eq!(of_b.right.get("hasPart"), Some(&vec![r]));
        assert_eq!(of_b.merged().len(), 1);
    }

    #[test]
    fn test_value_type_must_match() {
        let (mut graph, a, _, _) = setup();
        let weight = graph
            .create_nodetype(
                "weight",
                Nodetype::attributetype("weight", AttributetypeSpec::new(a, DataType::Integer)),
            )
            .unwrap();
        let err = graph
            .create_attribute(a, weight, AttributeValue::Char("heavy".into()), AttributeScopes::none())
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue { .. }));

        let ok = graph.create_attribute_from_str(a, weight, "12", AttributeScopes::none());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_remove_edge_blocked_by_node_specification() {
        let (mut graph, a, b, part_of) = setup();
        let r = graph.create_relation(a, part_of, b, RelationScopes::none()).unwrap();
        let spec = graph
            .create_node(NewNode::new(
                "A in B",
                crate::ontology::NodeSpecification::new(a).with_relations([r]),
            ))
            .unwrap();
        assert!(matches!(
            graph.remove_edge(r),
            Err(GraphError::ReferentialIntegrity { referenced_by, .. }) if referenced_by == vec![spec]
        ));
    }
}
