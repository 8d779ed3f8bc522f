use gnowgraph_core::config::{GraphConfig, StorageConfig};
use gnowgraph_core::graph::Cascade;
use gnowgraph_core::import::ImportDocument;
use gnowgraph_core::ontology::{
    AttributeScopes, AttributetypeSpec, DataType, Metatype, Nid, Nodetype, RelationScopes,
    RelationtypeSpec, Status,
};
use gnowgraph_core::{FileStorage, GraphError, GraphManager, ManagerError, Storage};
use tempfile::TempDir;

fn storage(dir: &TempDir) -> FileStorage {
    FileStorage::with_config(StorageConfig {
        data_dir: dir.path().to_string_lossy().to_string(),
        ..StorageConfig::default()
    })
}

fn create_test_manager() -> (GraphManager<FileStorage>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let manager = GraphManager::new(storage(&temp_dir)).unwrap();
    (manager, temp_dir)
}

#[test]
fn test_writes_survive_reopen() {
    let (mut manager, temp) = create_test_manager();

    let concept = manager.create_metatype("Concept", Metatype::new("concept")).unwrap();
    let vehicle = manager
        .create_nodetype("Vehicle", Nodetype::new("vehicle").with_metatypes([concept]))
        .unwrap();
    let color = manager
        .create_nodetype(
            "color",
            Nodetype::attributetype("color", AttributetypeSpec::new(vehicle, DataType::Char)),
        )
        .unwrap();
    manager
        .create_attribute(vehicle, color, "red", AttributeScopes::default())
        .unwrap();
    assert!(manager.storage().exists());

    let reopened = GraphManager::new(storage(&temp)).unwrap();
    let graph = reopened.graph();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.attributes_of(vehicle)["color"], "red");
    assert_eq!(graph.node(vehicle).unwrap().title, "Vehicle");
}

#[test]
fn test_failed_write_is_not_persisted() {
    let (mut manager, temp) = create_test_manager();
    let wheel = manager.create_nodetype("Wheel", Nodetype::new("wheel")).unwrap();
    let car = manager.create_nodetype("Car", Nodetype::new("car")).unwrap();
    let part_of = manager
        .create_nodetype(
            "partOf",
            Nodetype::relationtype("part-of", RelationtypeSpec::new("hasPart", wheel, car)),
        )
        .unwrap();
    manager
        .create_relation(wheel, part_of, car, RelationScopes::default())
        .unwrap();

    let duplicate = manager.create_relation(wheel, part_of, car, RelationScopes::default());
    assert!(matches!(
        duplicate,
        Err(ManagerError::Graph(GraphError::DuplicateEdge { .. }))
    ));
    assert_eq!(manager.graph().edge_count(), 1);

    let reopened = GraphManager::new(storage(&temp)).unwrap();
    assert_eq!(reopened.graph().edge_count(), 1);
}

fn part_of_manager() -> (GraphManager<FileStorage>, TempDir, [Nid; 5]) {
    let (mut manager, temp) = create_test_manager();
    let part = manager.create_nodetype("Part", Nodetype::new("part")).unwrap();
    let whole = manager.create_nodetype("Whole", Nodetype::new("whole")).unwrap();
    let part_of = manager
        .create_nodetype(
            "partOf",
            Nodetype::relationtype("part-of", RelationtypeSpec::new("hasPart", part, whole)),
        )
        .unwrap();
    let wheel = manager.create_nodetype("Wheel", Nodetype::new("wheel")).unwrap();
    let car = manager.create_nodetype("Car", Nodetype::new("car")).unwrap();
    manager
        .create_relation(wheel, part_of, car, RelationScopes::default())
        .unwrap();
    (manager, temp, [part, whole, part_of, wheel, car])
}

#[test]
fn test_remove_node_with_cascade() {
    let (mut manager, temp, [_, _, _, wheel, car]) = part_of_manager();

    assert!(matches!(
        manager.remove_node(wheel, Cascade::Restrict),
        Err(ManagerError::Graph(GraphError::ReferentialIntegrity { .. }))
    ));
    let removed = manager.remove_node(wheel, Cascade::Edges).unwrap();
    assert_eq!(removed.title, "Wheel");

    let reopened = GraphManager::new(storage(&temp)).unwrap();
    assert!(reopened.graph().get_node(wheel).is_none());
    assert!(reopened.graph().get_node(car).is_some());
    assert_eq!(reopened.graph().edge_count(), 0);
}

#[test]
fn test_remove_subjecttype_blocked_by_relationtype() {
    let (mut manager, temp, [part, _, part_of, _, _]) = part_of_manager();

    match manager.remove_node(part, Cascade::Edges) {
        Err(ManagerError::Graph(GraphError::ReferentialIntegrity { nid, referenced_by })) => {
            assert_eq!(nid, part);
            assert_eq!(referenced_by, vec![part_of]);
        }
        other => panic!("expected ReferentialIntegrity, got {:?}", other),
    }

    let reopened = GraphManager::new(storage(&temp)).unwrap();
    assert!(reopened.graph().get_node(part).is_some());
    assert_eq!(reopened.graph().edge_count(), 1);
}

#[test]
fn test_blocked_edge_removal_keeps_store_loadable() {
    let (mut manager, temp, [_, _, part_of, wheel, car]) = part_of_manager();
    let fact = manager.graph().relations_of(wheel).left["partOf"][0];
    let note = manager.create_nodetype("Note", Nodetype::new("note")).unwrap();
    let remark = manager
        .create_relation(note, part_of, fact, RelationScopes::default())
        .unwrap();

    assert!(matches!(
        manager.remove_edge(fact),
        Err(ManagerError::Graph(GraphError::ReferentialIntegrity { .. }))
    ));
    let reopened = GraphManager::new(storage(&temp)).unwrap();
    assert_eq!(reopened.graph().edge_count(), 2);

    manager.remove_node(car, Cascade::Edges).unwrap();
    let reopened = GraphManager::new(storage(&temp)).unwrap();
    assert_eq!(reopened.graph().edge_count(), 0);
    assert!(reopened.graph().get_edge(remark).is_none());
}

#[test]
fn test_status_and_dependencies_persist() {
    let (mut manager, temp) = create_test_manager();
    let wheel = manager.create_nodetype("Wheel", Nodetype::new("wheel")).unwrap();
    let car = manager.create_nodetype("Car", Nodetype::new("car")).unwrap();
    assert!(manager.add_prior(car, wheel).unwrap());
    manager.set_status(car, Status::Draft).unwrap();

    let reopened = GraphManager::new(storage(&temp)).unwrap();
    let graph = reopened.graph();
    assert_eq!(graph.prior_nodes(car), vec![wheel]);
    assert_eq!(
        graph.node(car).unwrap().as_nodetype().unwrap().publication.status,
        Status::Draft
    );
}

#[test]
fn test_import_through_manager() {
    let (mut manager, temp) = create_test_manager();
    let doc = ImportDocument::from_yaml(
        "metatypes:\n  - title: Concept\n    slug: concept\nnodetypes:\n  - title: Idea\n    slug: idea\n    metatypes: [concept]\n",
    )
    .unwrap();

    let report = manager.import(&doc).unwrap();
    assert_eq!(report.total(), 2);

    let reopened = GraphManager::open(storage(&temp), GraphConfig::default()).unwrap();
    assert_eq!(reopened.into_graph().find_by_slug("idea").len(), 1);
}
