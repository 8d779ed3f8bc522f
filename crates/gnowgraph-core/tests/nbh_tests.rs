use gnowgraph_core::graph::Graph;
use gnowgraph_core::locator::Locator;
use gnowgraph_core::nbh::GraphJsonError;
use gnowgraph_core::ontology::{
    AttributeScopes, AttributetypeSpec, DataType, Gbobject, Metatype, Nid, Nodetype,
    RelationScopes, RelationtypeSpec,
};
use serde_json::Value;

const FIXED_KEYS: [&str; 7] = [
    "title",
    "altnames",
    "plural",
    "member_of",
    "contains_subtypes",
    "contains_members",
    "authors",
];

#[test]
fn test_fixed_keys_are_always_present() {
    let mut graph = Graph::new();
    let nid = graph.create_nodetype("Bare", Nodetype::new("bare")).unwrap();
    let value = serde_json::to_value(graph.nbh(nid).unwrap()).unwrap();

    for key in FIXED_KEYS {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    for key in ["altnames", "member_of", "contains_subtypes", "contains_members", "authors"] {
        assert_eq!(value[key], Value::Array(vec![]), "{} is not an empty list", key);
    }
    assert_eq!(value["plural"], Value::Null);
}

#[test]
fn test_member_of_metatypes_alias_reads_back() {
    let mut graph = Graph::new();
    let nid = graph.create_nodetype("Bare", Nodetype::new("bare")).unwrap();
    let mut value = serde_json::to_value(graph.nbh(nid).unwrap()).unwrap();
    let members = value["member_of"].take();
    let object = value.as_object_mut().unwrap();
    object.remove("member_of");
    object.insert("member_of_metatypes".to_string(), members);

    let back: gnowgraph_core::Neighbourhood = serde_json::from_value(value).unwrap();
    assert_eq!(back, graph.nbh(nid).unwrap());
}

fn vehicle_graph() -> (Graph, Nid, Nid, Nid, Nid) {
    let mut graph = Graph::new();
    let concept = graph.create_metatype("Concept", Metatype::new("concept")).unwrap();
    let vehicle = graph
        .create_nodetype(
            "Vehicle",
            Nodetype::objecttype("vehicle")
                .with_metatypes(vec![concept])
                .with_authors(["ann", "bob"]),
        )
        .unwrap();
    let wheel = graph.create_nodetype("Wheel", Nodetype::objecttype("wheel")).unwrap();
    let part_of = graph
        .create_nodetype(
            "partOf",
            Nodetype::relationtype("part-of", RelationtypeSpec::new("hasPart", wheel, vehicle)),
        )
        .unwrap();
    graph.create_relation(wheel, part_of, vehicle, RelationScopes::none()).unwrap();
    let color = graph
        .create_nodetype(
            "color",
            Nodetype::attributetype("color", AttributetypeSpec::new(vehicle, DataType::Char)),
        )
        .unwrap();
    graph
        .create_attribute_from_str(vehicle, color, "blue", AttributeScopes::none())
        .unwrap();
    (graph, concept, vehicle, wheel, part_of)
}

#[test]
fn test_nbh_collects_every_group() {
    let (mut graph, concept, vehicle, wheel, part_of) = vehicle_graph();
    let car = graph
        .create_nodetype("Car", Nodetype::objecttype("car").with_parent(vehicle))
        .unwrap();
    let herbie = graph
        .create_gbobject("Herbie", Gbobject::new("herbie").with_objecttypes(vec![vehicle]))
        .unwrap();
    graph.add_prior(vehicle, wheel).unwrap();

    let nbh = graph.nbh(vehicle).unwrap();
    assert_eq!(nbh.member_of, vec![concept]);
    assert_eq!(nbh.contains_subtypes, vec![car]);
    assert_eq!(nbh.contains_members, vec![herbie]);
    assert_eq!(nbh.prior_nodes, vec![wheel]);
    assert_eq!(nbh.authors, vec!["ann".to_string(), "bob".to_string()]);
    assert_eq!(nbh.relations.right.get("hasPart"), Some(&vec![wheel]));
    assert_eq!(nbh.attributes.get("color").map(String::as_str), Some("blue"));
    assert_eq!(nbh.right_subjecttype_of, vec![part_of]);
    assert_eq!(nbh.attributetypes.len(), 1);

    let wheel_nbh = graph.nbh(wheel).unwrap();
    assert_eq!(wheel_nbh.posterior_nodes, vec![vehicle]);
    assert_eq!(wheel_nbh.relations.left.get("partOf"), Some(&vec![vehicle]));
    assert_eq!(wheel_nbh.left_subjecttype_of, vec![part_of]);

    assert_eq!(graph.nbh(car).unwrap().type_of, Some(vehicle));
    assert_eq!(graph.nbh(concept).unwrap().contains_members, vec![vehicle]);
}

#[test]
fn test_prior_posterior_symmetry() {
    let (mut graph, _, vehicle, wheel, _) = vehicle_graph();
    let engine = graph.create_nodetype("Engine", Nodetype::objecttype("engine")).unwrap();

    graph.add_prior(vehicle, wheel).unwrap();
    graph.add_posterior(engine, vehicle).unwrap();
    assert!(!graph.add_prior(vehicle, wheel).unwrap());

    let check = |g: &Graph| {
        for d in g.dependencies() {
            assert!(g.prior_nodes(d.dependent).contains(&d.prior));
            assert!(g.posterior_nodes(d.prior).contains(&d.dependent));
        }
    };
    check(&graph);
    assert_eq!(graph.prior_nodes(vehicle), vec![wheel, engine]);

    graph.set_prior_nodes(vehicle, &[engine]).unwrap();
    check(&graph);
    assert!(graph.posterior_nodes(wheel).is_empty());

    assert!(graph.remove_prior(vehicle, engine));
    assert!(graph.posterior_nodes(engine).is_empty());

    let concept = graph.find_by_slug("concept")[0].nid;
    assert!(graph.add_prior(vehicle, concept).is_err());
    assert!(graph.add_prior(vehicle, vehicle).is_err());
}

#[test]
fn test_rendered_nbh_uses_locators() {
    let (graph, _, vehicle, wheel, _) = vehicle_graph();
    let locator = Locator::new("https", "graph.example.org");
    let rendered = graph.rendered_nbh(vehicle, &locator).unwrap();

    assert_eq!(rendered.member_of[0].title, "Concept");
    assert_eq!(
        rendered.member_of[0].locator,
        "https://graph.example.org/metatypes/concept/"
    );
    let part = &rendered.relations.right["hasPart"][0];
    assert_eq!(part.title, "Wheel");
    assert_eq!(part.locator, locator.locate_absolute(&graph, wheel).unwrap());
    assert_eq!(rendered.authors[1].locator, "https://graph.example.org/authors/bob/");
}

#[test]
fn test_graph_json_export() {
    let (mut graph, concept, vehicle, _, _) = vehicle_graph();
    graph
        .update_node(vehicle, |n| {
            n.altnames = vec!["automobile".to_string(), "motor".to_string()];
        })
        .unwrap();
    let locator = Locator::new("http", "example.com");
    let value = serde_json::to_value(graph.graph_json(vehicle, &locator).unwrap()).unwrap();

    assert!(value.get("plural").is_none());
    assert_eq!(value["altnames"][0]["from"], vehicle.to_string());
    assert_eq!(value["altnames"][0]["to"], "a2");
    assert_eq!(value["altnames"][1]["to"], "a5");
    assert_eq!(value["member_of"][0]["to"], "a3");
    assert_eq!(value["member_of"][1]["to"], concept.to_string());
    for link in value["member_of"].as_array().unwrap() {
        assert_eq!(link["value"], 1);
    }

    let metadata = value["node_metadata"].as_array().unwrap();
    let ids: Vec<&str> = metadata.iter().map(|m| m["_id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec!["a2", "a5", "a3", concept.to_string().as_str(), vehicle.to_string().as_str()]
    );
    let this_node = metadata.last().unwrap();
    assert_eq!(this_node["screen_name"], "Vehicle");
    assert_eq!(this_node["altnames"], "automobile, motor");
    assert!(this_node["url"].as_str().unwrap().starts_with("http://example.com/nodetypes/"));
}

#[test]
fn test_graph_json_reports_dangling_members() {
    let (graph, concept, vehicle, _, _) = vehicle_graph();
    // Restoring only re-checks edges, so a snapshot missing a metatype
    // still loads, with the nodetype's membership left dangling.
    let mut snapshot = graph.snapshot();
    snapshot.nodes.retain(|n| n.nid != concept);
    let damaged = Graph::restore(snapshot, Default::default()).unwrap();

    let err = damaged
        .graph_json(vehicle, &Locator::new("http", "example.com"))
        .unwrap_err();
    match err {
        GraphJsonError::DanglingReference { predicate, nid } => {
            assert_eq!(predicate, "member_of");
            assert_eq!(nid, concept);
        }
        other => panic!("expected a dangling reference, got {:?}", other),
    }
}
