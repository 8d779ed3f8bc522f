use chrono::{Duration, TimeZone, Utc};

use gnowgraph_core::graph::{Graph, GraphError};
use gnowgraph_core::ontology::{default_end_publication, Gbobject, Nodetype, Status};

#[test]
fn test_visibility_scenario() {
    let now = Utc::now();
    let mut graph = Graph::new();
    let nid = graph
        .create_nodetype(
            "News",
            Nodetype::new("news").with_start_publication(now - Duration::days(10)),
        )
        .unwrap();

    let end = graph.node(nid).unwrap().publication().unwrap().end_publication;
    assert_eq!(end, default_end_publication());
    assert_eq!(end, Utc.with_ymd_and_hms(2042, 3, 15, 0, 0, 0).unwrap());
    assert!(graph.is_visible(nid, now).unwrap());

    graph.set_status(nid, Status::Draft).unwrap();
    assert!(!graph.is_visible(nid, now).unwrap());
    assert!(graph.is_actual(nid, now).unwrap());
}

#[test]
fn test_visible_iff_published_and_actual() {
    let now = Utc::now();
    let mut graph = Graph::new();
    let windows = [
        (now - Duration::days(1), now + Duration::days(1)),
        (now + Duration::days(1), now + Duration::days(2)),
        (now - Duration::days(2), now - Duration::days(1)),
        (now, now + Duration::seconds(1)),
        (now - Duration::seconds(1), now),
    ];
    let statuses = [Status::Draft, Status::Hidden, Status::Published];

    for (i, (start, end)) in windows.iter().enumerate() {
        for (j, status) in statuses.iter().enumerate() {
            let nid = graph
                .create_nodetype(
                    format!("N{}{}", i, j),
                    Nodetype::new(format!("n{}{}", i, j))
                        .with_start_publication(*start)
                        .with_end_publication(*end)
                        .with_status(*status),
                )
                .unwrap();
            let expected = *status == Status::Published && *start <= now && now < *end;
            assert_eq!(graph.is_visible(nid, now).unwrap(), expected, "window {} status {}", i, status);
        }
    }
}

#[test]
fn test_hidden_is_terminal() {
    let mut graph = Graph::new();
    let nid = graph.create_nodetype("N", Nodetype::new("n")).unwrap();
    graph.set_status(nid, Status::Hidden).unwrap();
    let err = graph.set_status(nid, Status::Draft).unwrap_err();
    assert!(matches!(
        err,
        GraphError::InvalidTransition { from: Status::Hidden, to: Status::Draft, .. }
    ));
}

#[test]
fn test_hidden_survives_direct_update() {
    let mut graph = Graph::new();
    let nid = graph.create_nodetype("N", Nodetype::new("n")).unwrap();
    graph.set_status(nid, Status::Hidden).unwrap();

    let err = graph
        .update_node(nid, |node| {
            if let Some(publication) = node.publication_mut() {
                publication.status = Status::Published;
            }
        })
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::InvalidTransition { from: Status::Hidden, to: Status::Published, .. }
    ));
    assert_eq!(
        graph.node(nid).unwrap().publication().map(|p| p.status),
        Some(Status::Hidden)
    );

    // Other edits of a hidden record still go through.
    graph.update_node(nid, |node| node.title = "Renamed".to_string()).unwrap();
    assert_eq!(graph.node(nid).unwrap().title, "Renamed");
}

#[test]
fn test_previous_and_next() {
    let base = Utc::now() - Duration::days(30);
    let mut graph = Graph::new();
    let mut make = |title: &str, days: i64| {
        let slug = title.to_lowercase();
        graph
            .create_nodetype(
                title,
                Nodetype::new(slug)
                    .with_creation_date(base + Duration::days(days))
                    .with_start_publication(base),
            )
            .unwrap()
    };
    let first = make("First", 1);
    let second = make("Second", 2);
    let third = make("Third", 3);
    let now = Utc::now();

    assert_eq!(graph.previous_nodetype(second, now).unwrap(), Some(first));
    assert_eq!(graph.next_nodetype(second, now).unwrap(), Some(third));
    assert_eq!(graph.previous_nodetype(first, now).unwrap(), None);
    assert_eq!(graph.published_nodetypes(now), vec![third, second, first]);

    graph.set_status(second, Status::Draft).unwrap();
    assert_eq!(graph.next_nodetype(first, now).unwrap(), Some(third));
}

#[test]
fn test_related_is_symmetric_and_visible_only() {
    let mut graph = Graph::new();
    let a = graph.create_nodetype("A", Nodetype::new("a")).unwrap();
    let b = graph
        .create_nodetype("B", Nodetype::new("b").with_related(vec![a]))
        .unwrap();
    let c = graph
        .create_nodetype("C", Nodetype::new("c").with_status(Status::Draft))
        .unwrap();
    graph
        .update_node(a, |n| {
            if let gnowgraph_core::ontology::NodeKind::Nodetype(t) = &mut n.kind {
                t.related.push(c);
            }
        })
        .unwrap();
    let now = Utc::now();

    assert_eq!(graph.related_published(a, now).unwrap(), vec![b]);
    assert_eq!(graph.related_published(b, now).unwrap(), vec![a]);
}

#[test]
fn test_content_helpers() {
    let mut graph = Graph::new();
    let plain = graph
        .create_nodetype("Plain", Nodetype::new("plain").with_content("one two\nthree\n\nfour"))
        .unwrap();
    let html = graph
        .create_nodetype("Html", Nodetype::new("html").with_content("<p>already <b>html</b></p>"))
        .unwrap();

    assert_eq!(
        graph.html_content(plain).unwrap(),
        "<p>one two<br />three</p>\n\n<p>four</p>"
    );
    assert_eq!(graph.html_content(html).unwrap(), "<p>already <b>html</b></p>");
    assert_eq!(graph.word_count(plain).unwrap(), 4);
    assert_eq!(graph.word_count(html).unwrap(), 2);
}

#[test]
fn test_objects_follow_the_same_lifecycle() {
    let now = Utc::now() + Duration::seconds(1);
    let mut graph = Graph::new();
    let obj = graph.create_gbobject("Obj", Gbobject::new("obj")).unwrap();
    assert!(graph.is_visible(obj, now).unwrap());
    graph.set_status(obj, Status::Hidden).unwrap();
    assert!(!graph.is_visible(obj, now).unwrap());
}
