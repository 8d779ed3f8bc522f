use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use super::xmlrpc::{self, Value};
use super::{PingError, PingReply, PingTransport};
use crate::graph::{Graph, GraphError};
use crate::locator::Locator;
use crate::ontology::Nid;

/// What a directory is told about one nodetype.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryPing {
    url: String,
    categories: String,
}

/// Notifies one weblog directory of new or updated nodetypes.
pub struct DirectoryPinger {
    server: String,
    site_name: String,
    locator: Locator,
    transport: Arc<dyn PingTransport>,
}

impl DirectoryPinger {
    pub fn new(
        server: impl Into<String>,
        site_name: impl Into<String>,
        locator: Locator,
        transport: Arc<dyn PingTransport>,
    ) -> Self {
        Self {
            server: server.into(),
            site_name: site_name.into(),
            locator,
            transport,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn entry(&self, graph: &Graph, nid: Nid) -> Result<EntryPing, GraphError> {
        let node = graph.node(nid)?;
        let metatypes = node
            .as_nodetype()
            .map(|n| n.metatypes.as_slice())
            .unwrap_or_default();
        let categories: Vec<&str> = metatypes.iter().filter_map(|m| graph.title_of(*m)).collect();
        Ok(EntryPing {
            url: self.locator.locate_absolute(graph, nid)?,
            categories: categories.join("|"),
        })
    }

    async fn call(&self, method: &str, params: &[&str]) -> Result<PingReply, PingError> {
        let body = xmlrpc::method_call(method, params);
        let response = self.transport.post_xml(&self.server, body).await?;
        let value = xmlrpc::parse_response(&response)?;
        Ok(PingReply {
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            flerror: value.get("flerror").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    async fn send(&self, entry: &EntryPing) -> PingReply {
        let blog_url = self.locator.nodetype_index();
        let feed_url = self.locator.latest_feed();

        let extended = self
            .call(
                "weblogUpdates.extendedPing",
                &[
                    self.site_name.as_str(),
                    blog_url.as_str(),
                    entry.url.as_str(),
                    feed_url.as_str(),
                    entry.categories.as_str(),
                ],
            )
            .await;
        let reply = match extended {
            Ok(reply) => reply,
            Err(_) => self
                .call(
                    "weblogUpdates.ping",
                    &[
                        self.site_name.as_str(),
                        blog_url.as_str(),
                        entry.url.as_str(),
                        entry.categories.as_str(),
                    ],
                )
                .await
                .unwrap_or_else(|e| {
                    warn!(server = %self.server, "ping failed: {}", e);
                    PingReply::error(format!("{} is an invalid directory.", self.server))
                }),
        };
        info!("{} : {}", self.server, reply.message);
        reply
    }

    /// Pings one nodetype.
    pub async fn ping(&self, graph: &Graph, nid: Nid) -> Result<PingReply, GraphError> {
        let entry = self.entry(graph, nid)?;
        Ok(self.send(&entry).await)
    }

    /// Pings every nodetype in turn, one reply per nodetype.
    ///
    /// Locators are resolved up front so the graph is not borrowed across
    /// the network calls.
    pub async fn ping_all(&self, graph: &Graph, nids: &[Nid]) -> Result<Vec<PingReply>, GraphError> {
        let entries = nids
            .iter()
            .map(|nid| self.entry(graph, *nid))
            .collect::<Result<Vec<_>, _>>()?;
        let mut replies = Vec::with_capacity(entries.len());
        for entry in &entries {
            replies.push(self.send(entry).await);
        }
        Ok(replies)
    }
}

/// Pings every directory concurrently. Results are returned per directory
/// in the order given.
pub async fn ping_directories(
    pingers: &[DirectoryPinger],
    graph: &Graph,
    nids: &[Nid],
) -> Result<Vec<(String, Vec<PingReply>)>, GraphError> {
    let mut prepared = Vec::with_capacity(pingers.len());
    for pinger in pingers {
        let entries = nids
            .iter()
            .map(|nid| pinger.entry(graph, *nid))
            .collect::<Result<Vec<_>, _>>()?;
        prepared.push((pinger, entries));
    }

    let runs = prepared.into_iter().map(|(pinger, entries)| async move {
        let mut replies = Vec::with_capacity(entries.len());
        for entry in &entries {
            replies.push(pinger.send(entry).await);
        }
        (pinger.server.clone(), replies)
    });
    Ok(join_all(runs).await)
}
