//! Node/link export of a neighbourhood for graph-visualization tools.
//!
//! The source vertex links to one synthetic predicate vertex per non-empty
//! key (`plural` a1, `altnames` a2, `member_of` a3), which in turn links to
//! each value. Literal values get their own vertex (a4 for the plural,
//! a5 for the altnames). The source vertex itself is listed last.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::graph::{Graph, GraphError};
use crate::locator::Locator;
use crate::ontology::Nid;

#[derive(Debug, Error)]
pub enum GraphJsonError {
    #[error("'{predicate}' refers to {nid}, which does not exist")]
    DanglingReference { predicate: &'static str, nid: Nid },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(rename = "_id")]
    pub id: String,
    pub screen_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Literal predicate values carried by the source vertex.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl NodeMetadata {
    fn predicate(id: &str, screen_name: &str) -> Self {
        Self {
            id: id.to_string(),
            screen_name: screen_name.to_string(),
            title: None,
            url: None,
            extra: BTreeMap::new(),
        }
    }

    fn vertex(nid: Nid, title: &str, url: String) -> Self {
        Self {
            id: nid.to_string(),
            screen_name: title.to_string(),
            title: Some(title.to_string()),
            url: Some(url),
            extra: BTreeMap::new(),
        }
    }
}

/// A weighted link. The weight is always 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub from: String,
    pub to: String,
    pub value: u32,
}

impl GraphLink {
    fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphJson {
    pub node_metadata: Vec<NodeMetadata>,
    /// One link list per non-empty predicate key.
    #[serde(flatten)]
    pub predicates: BTreeMap<String, Vec<GraphLink>>,
}

const PLURAL: (&str, &str, &str) = ("plural", "a1", "a4");
const ALTNAMES: (&str, &str, &str) = ("altnames", "a2", "a5");
const MEMBER_OF: (&str, &str) = ("member_of", "a3");

impl Graph {
    /// Exports the `plural`, `altnames` and `member_of` part of a
    /// neighbourhood.
    pub fn graph_json(&self, nid: Nid, locator: &Locator) -> Result<GraphJson, GraphJsonError> {
        let nbh = self.nbh(nid)?;
        let source = nid.to_string();
        let mut out = GraphJson::default();
        let mut this_node =
            NodeMetadata::vertex(nid, &nbh.title, locator.locate_absolute(self, nid)?);

        let altnames = nbh.altnames.join(", ");
        let literals = [(PLURAL, nbh.plural.unwrap_or_default()), (ALTNAMES, altnames)];
        for ((key, predicate_id, value_id), value) in literals {
            if value.is_empty() {
                continue;
            }
            out.node_metadata.push(NodeMetadata::predicate(predicate_id, key));
            out.node_metadata.push(NodeMetadata::predicate(value_id, &value));
            out.predicates.insert(
                key.to_string(),
                vec![
                    GraphLink::new(source.as_str(), predicate_id),
                    GraphLink::new(predicate_id, value_id),
                ],
            );
            this_node.extra.insert(key.to_string(), value);
        }

        let (key, predicate_id) = MEMBER_OF;
        if !nbh.member_of.is_empty() {
            out.node_metadata.push(NodeMetadata::predicate(predicate_id, key));
            let mut links = vec![GraphLink::new(source.as_str(), predicate_id)];
            for member in &nbh.member_of {
                let node = self.get_node(*member).ok_or(GraphJsonError::DanglingReference {
                    predicate: key,
                    nid: *member,
                })?;
                out.node_metadata.push(NodeMetadata::vertex(
                    *member,
                    &node.title,
                    locator.locate_absolute(self, *member)?,
                ));
                links.push(GraphLink::new(predicate_id, member.to_string()));
            }
            out.predicates.insert(key.to_string(), links);
        }

        out.node_metadata.push(this_node);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{Gbobject, Nodetype};
    use serde_json::json;

    #[test]
    fn test_graph_json_shape() {
        let mut graph = Graph::new();
        let locator = Locator::new("http", "example.com");
        let ot = graph.create_nodetype("Car", Nodetype::objecttype("car")).unwrap();
        let obj = graph
            .create_gbobject("Herbie", Gbobject::new("herbie").with_objecttypes(vec![ot]))
            .unwrap();
        graph
            .update_node(obj, |n| n.plural = Some("Herbies".to_string()))
            .unwrap();

        let export = graph.graph_json(obj, &locator).unwrap();
        let value = serde_json::to_value(&export).unwrap();

        assert!(value.get("altnames").is_none());
        assert_eq!(
            value["plural"],
            json!([
                {"from": obj.to_string(), "to": "a1", "value": 1},
                {"from": "a1", "to": "a4", "value": 1}
            ])
        );
        assert_eq!(value["member_of"][1]["to"], json!(ot.to_string()));

        let this_node = export.node_metadata.last().unwrap();
        assert_eq!(this_node.id, obj.to_string());
        assert_eq!(this_node.extra["plural"], "Herbies");
        assert_eq!(value["node_metadata"].as_array().unwrap().last().unwrap()["plural"], "Herbies");
    }

    #[test]
    fn test_graph_json_without_predicates() {
        let mut graph = Graph::new();
        let locator = Locator::new("http", "example.com");
        let nid = graph.create_nodetype("Plain", Nodetype::new("plain")).unwrap();
        let export = graph.graph_json(nid, &locator).unwrap();
        assert!(export.predicates.is_empty());
        assert_eq!(export.node_metadata.len(), 1);
    }
}
