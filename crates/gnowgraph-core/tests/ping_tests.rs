use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use gnowgraph_core::config::PingConfig;
use gnowgraph_core::graph::Graph;
use gnowgraph_core::locator::Locator;
use gnowgraph_core::ontology::{Metatype, Nid, Nodetype, Status};
use gnowgraph_core::ping::{
    ping_directories, ping_on_save, DirectoryPinger, ExternalUrlsPinger, FetchedPage, PingError,
    PingReply, PingTransport,
};

const GOOD: &str = "http://good.example/RPC2";
const LEGACY: &str = "http://legacy.example/RPC2";
const DOWN: &str = "http://down.example/RPC2";
const PINGBACK_SERVER: &str = "http://blog.example/xmlrpc";

const THANKS: &str = r#"<?xml version="1.0"?>
<methodResponse><params><param><value><struct>
  <member><name>flerror</name><value><boolean>0</boolean></value></member>
  <member><name>message</name><value><string>Thanks for the ping.</string></value></member>
</struct></value></param></params></methodResponse>"#;

const UNKNOWN_METHOD: &str = r#"<methodResponse><fault><value><struct>
  <member><name>faultCode</name><value><int>-32601</int></value></member>
  <member><name>faultString</name><value><string>unknown method</string></value></member>
</struct></value></fault></methodResponse>"#;

const REGISTERED: &str = "<methodResponse><params><param><value><string>Pingback registered</string></value></param></params></methodResponse>";

/// In-memory stand-in for the network.
#[derive(Default)]
struct FakeNetwork {
    posts: Mutex<Vec<(String, String)>>,
    pages: HashMap<String, FetchedPage>,
}

impl FakeNetwork {
    fn with_page(mut self, url: &str, headers: &[(&str, &str)], body: &str) -> Self {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                headers,
                body: body.to_string(),
            },
        );
        self
    }

    fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PingTransport for FakeNetwork {
    async fn post_xml(&self, url: &str, body: String) -> Result<String, PingError> {
        self.posts.lock().unwrap().push((url.to_string(), body.clone()));
        match url {
            GOOD => Ok(THANKS.to_string()),
            LEGACY if body.contains("extendedPing") => Ok(UNKNOWN_METHOD.to_string()),
            LEGACY => Ok(THANKS.to_string()),
            PINGBACK_SERVER => Ok(REGISTERED.to_string()),
            _ => Err(PingError::Network(format!("connection refused: {}", url))),
        }
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, PingError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| PingError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn locator() -> Locator {
    Locator::new("http", "example.com")
}

fn entry(graph: &mut Graph) -> Nid {
    let concept = graph.create_metatype("Concept", Metatype::new("concept")).unwrap();
    let event = graph.create_metatype("Event", Metatype::new("event")).unwrap();
    graph
        .create_nodetype(
            "Vehicle",
            Nodetype::new("vehicle").with_metatypes([concept, event]),
        )
        .unwrap()
}

#[tokio::test]
async fn test_extended_ping_carries_categories() {
    let mut graph = Graph::new();
    let nid = entry(&mut graph);
    let network = Arc::new(FakeNetwork::default());
    let pinger = DirectoryPinger::new(GOOD, "My site", locator(), network.clone());

    let reply = pinger.ping(&graph, nid).await.unwrap();
    assert_eq!(reply, PingReply::ok("Thanks for the ping."));

    let posts = network.posts();
    assert_eq!(posts.len(), 1);
    let body = &posts[0].1;
    assert!(body.contains("weblogUpdates.extendedPing"));
    assert!(body.contains("<string>Concept|Event</string>"));
    assert!(body.contains("<string>http://example.com/nodetypes/</string>"));
}

#[tokio::test]
async fn test_falls_back_to_plain_ping() {
    let mut graph = Graph::new();
    let nid = entry(&mut graph);
    let network = Arc::new(FakeNetwork::default());
    let pinger = DirectoryPinger::new(LEGACY, "My site", locator(), network.clone());

    let reply = pinger.ping(&graph, nid).await.unwrap();
    assert!(!reply.flerror);

    let methods: Vec<bool> = network
        .posts()
        .iter()
        .map(|(_, body)| body.contains("extendedPing"))
        .collect();
    assert_eq!(methods, vec![true, false]);
}

#[tokio::test]
async fn test_unreachable_directory_is_reported() {
    let mut graph = Graph::new();
    let nid = entry(&mut graph);
    let pinger = DirectoryPinger::new(DOWN, "My site", locator(), Arc::new(FakeNetwork::default()));

    let reply = pinger.ping(&graph, nid).await.unwrap();
    assert_eq!(
        reply,
        PingReply::error(format!("{} is an invalid directory.", DOWN))
    );
}

#[tokio::test]
async fn test_one_failing_directory_does_not_stop_the_others() {
    let mut graph = Graph::new();
    let first = entry(&mut graph);
    let second = graph.create_nodetype("Wheel", Nodetype::new("wheel")).unwrap();
    let network: Arc<dyn PingTransport> = Arc::new(FakeNetwork::default());
    let pingers: Vec<DirectoryPinger> = [GOOD, DOWN, LEGACY]
        .into_iter()
        .map(|server| DirectoryPinger::new(server, "My site", locator(), network.clone()))
        .collect();

    let results = ping_directories(&pingers, &graph, &[first, second]).await.unwrap();

    let servers: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(servers, vec![GOOD, DOWN, LEGACY]);
    for (server, replies) in &results {
        assert_eq!(replies.len(), 2);
        let failed = replies.iter().all(|r| r.flerror);
        assert_eq!(failed, *server == DOWN);
    }
}

#[tokio::test]
async fn test_missing_node_fails_before_any_request() {
    let graph = Graph::new();
    let network = Arc::new(FakeNetwork::default());
    let pinger = DirectoryPinger::new(GOOD, "My site", locator(), network.clone());

    assert!(pinger.ping(&graph, Nid(42)).await.is_err());
    assert!(network.posts().is_empty());
}

#[tokio::test]
async fn test_pingbacks_to_linked_pages() {
    let mut graph = Graph::new();
    let nid = graph
        .create_nodetype(
            "Vehicle",
            Nodetype::new("vehicle").with_content(
                r#"<p>See <a href="http://blog.example/wheels/">wheels</a>,
                <a href="http://plain.example/">plain</a>,
                <a href="http://gone.example/">gone</a>
                and <a href="http://example.com/about/">us</a>.</p>"#,
            ),
        )
        .unwrap();

    let network = Arc::new(
        FakeNetwork::default()
            .with_page(
                "http://blog.example/wheels/",
                &[("content-type", "text/html"), ("x-pingback", "/xmlrpc")],
                "<html></html>",
            )
            .with_page(
                "http://plain.example/",
                &[("content-type", "text/html")],
                "<html><head></head></html>",
            ),
    );
    let pinger = ExternalUrlsPinger::new(locator(), network.clone());

    let results = pinger.ping(&graph, nid).await.unwrap();
    assert_eq!(
        results,
        vec![(
            "http://blog.example/wheels/".to_string(),
            PingReply::ok("Pingback registered")
        )]
    );

    let posts = network.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, PINGBACK_SERVER);
    assert!(posts[0].1.contains("pingback.ping"));
    assert!(posts[0].1.contains("<string>http://blog.example/wheels/</string>"));
}

#[test]
fn test_pingback_server_from_link_element() {
    let pinger = ExternalUrlsPinger::new(locator(), Arc::new(FakeNetwork::default()));
    let page = FetchedPage {
        headers: HashMap::from([("content-type".to_string(), "text/html; charset=utf-8".to_string())]),
        body: r#"<html><head><link rel="pingback" href="http://blog.example/xmlrpc" /></head></html>"#
            .to_string(),
    };
    assert_eq!(
        pinger.find_pingback_server("http://blog.example/post/", &page),
        Some(PINGBACK_SERVER.to_string())
    );

    let image = FetchedPage {
        headers: HashMap::from([
            ("content-type".to_string(), "image/png".to_string()),
            ("x-pingback".to_string(), PINGBACK_SERVER.to_string()),
        ]),
        body: String::new(),
    };
    assert_eq!(pinger.find_pingback_server("http://blog.example/a.png", &image), None);
}

fn save_config(directories: bool, external: bool) -> PingConfig {
    PingConfig {
        directories: vec![GOOD.to_string(), DOWN.to_string()],
        save_ping_directories: directories,
        save_ping_external_urls: external,
        ..PingConfig::default()
    }
}

fn linking_entry(graph: &mut Graph, status: Status) -> Nid {
    graph
        .create_nodetype(
            "Vehicle",
            Nodetype::new("vehicle")
                .with_status(status)
                .with_content(r#"<a href="http://blog.example/wheels/">wheels</a>"#),
        )
        .unwrap()
}

fn blog_network() -> Arc<FakeNetwork> {
    Arc::new(FakeNetwork::default().with_page(
        "http://blog.example/wheels/",
        &[("content-type", "text/html"), ("x-pingback", PINGBACK_SERVER)],
        "<html></html>",
    ))
}

#[tokio::test]
async fn test_save_pings_directories_and_linked_pages() {
    let mut graph = Graph::new();
    let nid = linking_entry(&mut graph, Status::Published);
    let network = blog_network();

    let pings = ping_on_save(
        &graph,
        nid,
        Utc::now(),
        &save_config(true, true),
        "My site",
        &locator(),
        network.clone(),
    )
    .await
    .unwrap();

    let directories: Vec<(&str, bool)> = pings
        .directories
        .iter()
        .map(|(server, reply)| (server.as_str(), reply.flerror))
        .collect();
    assert_eq!(directories, vec![(GOOD, false), (DOWN, true)]);
    assert_eq!(
        pings.external,
        vec![(
            "http://blog.example/wheels/".to_string(),
            PingReply::ok("Pingback registered")
        )]
    );
    assert_eq!(pings.iter().count(), 3);
}

#[tokio::test]
async fn test_save_pings_follow_config_switches() {
    let mut graph = Graph::new();
    let nid = linking_entry(&mut graph, Status::Published);

    let network = blog_network();
    let pings = ping_on_save(&graph, nid, Utc::now(), &save_config(false, false), "My site", &locator(), network.clone())
        .await
        .unwrap();
    assert!(pings.is_empty());
    assert!(network.posts().is_empty());

    let network = blog_network();
    let pings = ping_on_save(&graph, nid, Utc::now(), &save_config(false, true), "My site", &locator(), network.clone())
        .await
        .unwrap();
    assert!(pings.directories.is_empty());
    assert_eq!(pings.external.len(), 1);
    assert_eq!(network.posts().len(), 1);
}

#[tokio::test]
async fn test_drafts_are_not_announced() {
    let mut graph = Graph::new();
    let nid = linking_entry(&mut graph, Status::Draft);
    let network = blog_network();

    let pings = ping_on_save(&graph, nid, Utc::now(), &save_config(true, true), "My site", &locator(), network.clone())
        .await
        .unwrap();
    assert!(pings.is_empty());
    assert!(network.posts().is_empty());
}
