//! Conversion from the ontology graph to the node/edge lists the
//! visualization client consumes.

use std::collections::HashSet;

use gnowgraph_core::ontology::NodeClass;
use gnowgraph_core::{Graph, Nid};

use super::models::{EdgeAttributes, GraphData, GraphEdge, GraphNode, NodeAttributes};

// =============================================================================
// Node Styling
// =============================================================================

/// Hex color for a node class.
fn class_color(class: NodeClass) -> &'static str {
    match class {
        NodeClass::Metatype => "#8250df",
        NodeClass::Objecttype | NodeClass::Nodetype => "#0969da",
        NodeClass::Relationtype => "#cf222e",
        NodeClass::Attributetype => "#9a6700",
        NodeClass::Node => "#1a7f37",
        _ => "#57606a",
    }
}

fn class_size(class: NodeClass) -> u32 {
    match class {
        NodeClass::Metatype => 14,
        NodeClass::Objecttype | NodeClass::Nodetype => 10,
        NodeClass::Relationtype | NodeClass::Attributetype => 8,
        _ => 6,
    }
}

// =============================================================================
// Graph Builder
// =============================================================================

/// Collects nodes and the edges between them.
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    seen_edges: HashSet<(Nid, Nid, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            seen_edges: HashSet::new(),
        }
    }

    /// Every node, with relation, membership and subtype links.
    pub fn build(mut self, graph: &Graph) -> GraphData {
        for node in graph.nodes() {
            let class = node.class();
            self.nodes.push(GraphNode {
                key: node.nid.to_string(),
                attributes: NodeAttributes {
                    label: node.title.clone(),
                    category: class.code().to_string(),
                    color: class_color(class).to_string(),
                    size: class_size(class),
                    slug: node.slug().map(str::to_string),
                },
            });

            if let Some(parent) = node.parent() {
                self.add_edge(node.nid, parent, "subtype_of");
            }
            if let Some(nodetype) = node.as_nodetype() {
                for metatype in &nodetype.metatypes {
                    self.add_edge(node.nid, *metatype, "member_of");
                }
            }
            if let Some(object) = node.as_gbobject() {
                for objecttype in &object.objecttypes {
                    self.add_edge(node.nid, *objecttype, "member_of");
                }
            }
        }

        for edge in graph.edges() {
            if let Some(relation) = edge.as_relation() {
                let label = graph
                    .title_of(relation.relationtype)
                    .unwrap_or("relation")
                    .to_string();
                self.add_edge(relation.left_subject, relation.right_subject, &label);
            }
        }

        let known: HashSet<String> = self.nodes.iter().map(|n| n.key.clone()).collect();
        self.edges
            .retain(|e| known.contains(&e.source) && known.contains(&e.target));

        GraphData {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    fn add_edge(&mut self, source: Nid, target: Nid, relationship: &str) {
        if !self.seen_edges.insert((source, target, relationship.to_string())) {
            return;
        }
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            attributes: Some(EdgeAttributes {
                relationship: relationship.to_string(),
            }),
        });
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
