use std::fs;
use tempfile::TempDir;

use gnowgraph_core::graph::Graph;
use gnowgraph_core::import::{ImportDocument, ImportError};
use gnowgraph_core::ontology::{Metatype, Nodetype};

const VEHICLES_JSON: &str = r#"{
  "metatypes": [{ "title": "Concept", "slug": "concept" }],
  "nodetypes": [
    { "title": "Vehicle", "slug": "vehicle", "metatypes": ["concept"],
      "altnames": ["automobile"], "plural": "Vehicles" },
    { "title": "Car", "slug": "car", "parent": "vehicle" },
    { "title": "Wheel", "slug": "wheel" }
  ],
  "relationtypes": [
    { "title": "partOf", "slug": "part-of", "inverse": "hasPart",
      "left": "wheel", "right": "vehicle" }
  ],
  "attributetypes": [
    { "title": "wheels", "slug": "wheels", "subjecttype": "vehicle",
      "data_type": "IntegerField" }
  ],
  "objects": [
    { "title": "My car", "slug": "my-car", "objecttypes": ["car"] }
  ],
  "relations": [
    { "left": "wheel", "relationtype": "part-of", "right": "car" }
  ],
  "attributes": [
    { "subject": "car", "attributetype": "wheels", "value": "4" }
  ]
}"#;

#[test]
fn test_import_json_document() {
    let mut graph = Graph::new();
    let report = ImportDocument::from_json(VEHICLES_JSON)
        .unwrap()
        .apply(&mut graph)
        .unwrap();

    assert_eq!(report.total(), 9);
    let (vehicle, car, wheel) = (report.nodetypes[0], report.nodetypes[1], report.nodetypes[2]);

    let vehicle_node = graph.node(vehicle).unwrap();
    assert_eq!(vehicle_node.altnames, vec!["automobile".to_string()]);
    assert_eq!(vehicle_node.plural.as_deref(), Some("Vehicles"));
    assert_eq!(graph.node(car).unwrap().parent(), Some(vehicle));
    assert_eq!(graph.attributes_of(car).get("wheels").map(String::as_str), Some("4"));
    assert_eq!(graph.relations_of(wheel).left["partOf"].len(), 1);

    let my_car = graph.node(report.objects[0]).unwrap();
    assert_eq!(my_car.as_gbobject().unwrap().objecttypes, vec![car]);
}

#[test]
fn test_import_from_files() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("vehicles.json");
    fs::write(&json, VEHICLES_JSON).unwrap();
    let yaml = dir.path().join("topics.yaml");
    fs::write(
        &yaml,
        "metatypes:\n  - title: Topic\n    slug: topic\n  - title: Sub topic\n    slug: sub-topic\n    parent: topic\n",
    )
    .unwrap();

    let mut graph = Graph::new();
    ImportDocument::from_file(&json).unwrap().apply(&mut graph).unwrap();
    let report = ImportDocument::from_file(&yaml).unwrap().apply(&mut graph).unwrap();

    assert_eq!(report.metatypes.len(), 2);
    assert_eq!(graph.tree_path(report.metatypes[1]).unwrap(), "topic/sub-topic");
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let result = ImportDocument::from_file(&dir.path().join("nope.yaml"));
    assert!(matches!(result, Err(ImportError::Read { .. })));
}

#[test]
fn test_failed_import_leaves_graph_untouched() {
    let mut graph = Graph::new();
    graph.create_metatype("Existing", Metatype::new("existing")).unwrap();
    let before = (graph.node_count(), graph.edge_count());

    let doc = ImportDocument::from_yaml(
        r#"
nodetypes:
  - title: Wheel
    slug: wheel
relations:
  - left: wheel
    relationtype: part-of
    right: car
"#,
    )
    .unwrap();

    match doc.apply(&mut graph) {
        Err(ImportError::UnknownSlug { slug, .. }) => assert_eq!(slug, "part-of"),
        other => panic!("expected unknown slug, got {:?}", other),
    }
    assert_eq!((graph.node_count(), graph.edge_count()), before);
    assert!(graph.find_by_slug("wheel").is_empty());
}

#[test]
fn test_slugs_resolve_against_existing_graph() {
    let mut graph = Graph::new();
    let concept = graph.create_metatype("Concept", Metatype::new("concept")).unwrap();

    let report = ImportDocument::from_yaml(
        "nodetypes:\n  - title: Idea\n    slug: idea\n    metatypes: [concept]\n",
    )
    .unwrap()
    .apply(&mut graph)
    .unwrap();

    let idea = graph.node(report.nodetypes[0]).unwrap();
    assert_eq!(idea.as_nodetype().unwrap().metatypes, vec![concept]);
}

#[test]
fn test_ambiguous_graph_slug_is_rejected() {
    let mut graph = Graph::new();
    graph.create_nodetype("Car", Nodetype::new("car")).unwrap();
    graph.create_gbobject("Car", gnowgraph_core::ontology::Gbobject::new("car")).unwrap();

    let result = ImportDocument::from_yaml(
        "attributetypes:\n  - title: color\n    slug: color\n    subjecttype: car\n    data_type: char\n",
    )
    .unwrap()
    .apply(&mut graph);
    assert!(matches!(result, Err(ImportError::AmbiguousSlug { .. })));
}

#[test]
fn test_unknown_data_type_is_invalid() {
    let mut graph = Graph::new();
    graph.create_nodetype("Car", Nodetype::new("car")).unwrap();

    let result = ImportDocument::from_yaml(
        "attributetypes:\n  - title: color\n    slug: color\n    subjecttype: car\n    data_type: rainbow\n",
    )
    .unwrap()
    .apply(&mut graph);
    assert!(matches!(result, Err(ImportError::Invalid { .. })));
}

#[test]
fn test_malformed_document_is_a_parse_error() {
    assert!(matches!(
        ImportDocument::from_yaml("metatypes: [{ slug: 1"),
        Err(ImportError::Parse(_))
    ));
}
