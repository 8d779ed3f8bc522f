use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use super::{ping_directories, DirectoryPinger, ExternalUrlsPinger, PingReply, PingTransport};
use crate::config::PingConfig;
use crate::graph::{Graph, GraphError};
use crate::locator::Locator;
use crate::ontology::Nid;

/// Replies gathered by [`ping_on_save`], as `(target, reply)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavePings {
    pub directories: Vec<(String, PingReply)>,
    pub external: Vec<(String, PingReply)>,
}

impl SavePings {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.external.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, PingReply)> {
        self.directories.iter().chain(self.external.iter())
    }
}

/// Announces a nodetype that was just written.
///
/// Directories are pinged when `save_ping_directories` is set and the
/// linked external pages when `save_ping_external_urls` is set. Records
/// that are not visible at `now`, and nodes without a publication, are
/// not announced.
pub async fn ping_on_save(
    graph: &Graph,
    nid: Nid,
    now: DateTime<Utc>,
    config: &PingConfig,
    site_name: &str,
    locator: &Locator,
    transport: Arc<dyn PingTransport>,
) -> Result<SavePings, GraphError> {
    let mut pings = SavePings::default();
    let node = graph.node(nid)?;
    if node.as_nodetype().is_none() || !graph.is_visible(nid, now)? {
        debug!(%nid, "not announced");
        return Ok(pings);
    }

    if config.save_ping_directories {
        let pingers: Vec<DirectoryPinger> = config
            .directories
            .iter()
            .map(|server| {
                DirectoryPinger::new(server.as_str(), site_name, locator.clone(), transport.clone())
            })
            .collect();
        for (server, replies) in ping_directories(&pingers, graph, &[nid]).await? {
            pings
                .directories
                .extend(replies.into_iter().map(|reply| (server.clone(), reply)));
        }
    }

    if config.save_ping_external_urls {
        let pinger = ExternalUrlsPinger::new(locator.clone(), transport);
        pings.external = pinger.ping(graph, nid).await?;
    }

    Ok(pings)
}
