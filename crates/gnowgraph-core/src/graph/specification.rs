//! Composed phrases for specification records and set groupings.

use super::{Graph, Result};
use crate::ontology::{Nid, NodeKind};

impl Graph {
    fn titles(&self, nids: &[Nid]) -> String {
        nids.iter()
            .filter_map(|nid| self.title_of(*nid))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The phrase a specification or set grouping stands for.
    ///
    /// - attribute / relation specification: "the {type} of {subjects}"
    /// - node specification: "the {subject} with {relations}, {attributes}"
    /// - union / complement / intersection: "the union of {nodetypes}", ...
    /// - anything else: its title
    pub fn composed_subject(&self, nid: Nid) -> Result<String> {
        let node = self.node(nid)?;
        let phrase = match &node.kind {
            NodeKind::AttributeSpecification(s) => format!(
                "the {} of {}",
                self.title_of(s.attributetype).unwrap_or_default(),
                self.titles(&s.subjects)
            ),
            NodeKind::RelationSpecification(s) => format!(
                "the {} of {}",
                self.title_of(s.relationtype).unwrap_or_default(),
                self.titles(&s.subjects)
            ),
            NodeKind::NodeSpecification(s) => format!(
                "the {} with {}, {}",
                self.title_of(s.subject).unwrap_or_default(),
                self.titles(&s.relations),
                self.titles(&s.attributes)
            ),
            NodeKind::Union(s) => format!("the union of {}", self.titles(&s.nodetypes)),
            NodeKind::Complement(s) => format!("the complement of {}", self.titles(&s.nodetypes)),
            NodeKind::Intersection(s) => {
                format!("the intersection of {}", self.titles(&s.nodetypes))
            }
            _ => node.title.clone(),
        };
        Ok(phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{
        AttributeScopes, AttributeSpecification, AttributeValue, AttributetypeSpec, DataType,
        NewNode, NodeKind, NodeSpecification, Nodetype, RelationScopes, RelationSpecification,
        RelationtypeSpec, SetExpression,
    };

    #[test]
    fn test_composed_subjects() {
        let mut graph = Graph::new();
        let car = graph.create_nodetype("Car", Nodetype::objecttype("car")).unwrap();
        let wheel = graph.create_nodetype("Wheel", Nodetype::objecttype("wheel")).unwrap();
        let color = graph
            .create_nodetype(
                "color",
                Nodetype::attributetype("color", AttributetypeSpec::new(car, DataType::Char)),
            )
            .unwrap();
        let part_of = graph
            .create_nodetype(
                "partOf",
                Nodetype::relationtype("part-of", RelationtypeSpec::new("hasPart", wheel, car)),
            )
            .unwrap();

        let at_spec = graph
            .create_node(NewNode::new("color spec", AttributeSpecification::new(color, [car, wheel])))
            .unwrap();
        assert_eq!(graph.composed_subject(at_spec).unwrap(), "the color of Car, Wheel");

        let rt_spec = graph
            .create_node(NewNode::new("part spec", RelationSpecification::new(part_of, [wheel])))
            .unwrap();
        assert_eq!(graph.composed_subject(rt_spec).unwrap(), "the partOf of Wheel");

        let rel = graph
            .create_relation(wheel, part_of, car, RelationScopes::none())
            .unwrap();
        let attr = graph
            .create_attribute(car, color, AttributeValue::Char("red".into()), AttributeScopes::none())
            .unwrap();
        let node_spec = graph
            .create_node(NewNode::new(
                "red car",
                NodeSpecification::new(car).with_relations([rel]).with_attributes([attr]),
            ))
            .unwrap();
        assert_eq!(
            graph.composed_subject(node_spec).unwrap(),
            "the Car with Wheel partOf Car, the color of Car is red"
        );

        let union = graph
            .create_node(NewNode::new("vehicles", NodeKind::Union(SetExpression::new([car, wheel]))))
            .unwrap();
        assert_eq!(graph.composed_subject(union).unwrap(), "the union of Car, Wheel");
        assert_eq!(graph.composed_sentence(union).unwrap(), "the union of Car, Wheel");
    }

    #[test]
    fn test_set_members_must_be_nodetypes() {
        let mut graph = Graph::new();
        let err = graph
            .create_node(NewNode::new("empty", NodeKind::Intersection(SetExpression::new([Nid(7)]))))
            .unwrap_err();
        assert!(matches!(err, crate::graph::GraphError::NotFound(Nid(7))));
    }
}
