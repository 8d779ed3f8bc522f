//! Publication lifecycle of Nodetypes and Gbobjects.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::{Graph, GraphError, Result};
use crate::ontology::{Nid, Node, NodeKind, Publication, Status};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break pattern"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Renders plain text as HTML paragraphs: blank lines separate paragraphs,
/// single newlines become `<br />`.
pub fn linebreaks(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    PARAGRAPH_BREAK
        .split(normalized.trim_matches('\n'))
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br />")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Removes HTML tags.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ").into_owned()
}

fn content_of(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Nodetype(n) => Some(&n.content),
        NodeKind::Gbobject(g) => Some(&g.content),
        _ => None,
    }
}

fn same_family(a: &Node, b: &Node) -> bool {
    matches!(
        (&a.kind, &b.kind),
        (NodeKind::Nodetype(_), NodeKind::Nodetype(_)) | (NodeKind::Gbobject(_), NodeKind::Gbobject(_))
    )
}

impl Graph {
    fn publication_of(&self, nid: Nid) -> Result<&Publication> {
        self.expect_node(nid, "Nodetype or Gbobject", |n| n.publication().is_some())?
            .publication()
            .ok_or(GraphError::NotFound(nid))
    }

    /// `now` lies within the publication window.
    pub fn is_actual(&self, nid: Nid, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.publication_of(nid)?.is_actual(now))
    }

    /// Actual and published.
    pub fn is_visible(&self, nid: Nid, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.publication_of(nid)?.is_visible(now))
    }

    /// Comments are open when enabled and, if a non-zero auto-close delay
    /// is set, fewer than that many days have passed since publication
    /// started. A delay of 0 disables auto-closing.
    pub fn comments_are_open(
        &self,
        nid: Nid,
        now: DateTime<Utc>,
        auto_close_after: Option<u32>,
    ) -> Result<bool> {
        let node = self.node(nid)?;
        let enabled = match &node.kind {
            NodeKind::Nodetype(n) => n.comment_enabled,
            NodeKind::Gbobject(g) => g.comment_enabled,
            _ => {
                return Err(GraphError::WrongKind {
                    nid,
                    expected: "Nodetype or Gbobject",
                    actual: node.kind.type_name(),
                })
            }
        };
        let publication = self.publication_of(nid)?;

        match auto_close_after {
            Some(days) if enabled && days > 0 => {
                Ok(now - publication.start_publication < Duration::days(i64::from(days)))
            }
            _ => Ok(enabled),
        }
    }

    /// Whether pingbacks may be received.
    pub fn pingback_enabled(&self, nid: Nid) -> Result<bool> {
        let node = self.node(nid)?;
        match &node.kind {
            NodeKind::Nodetype(n) => Ok(n.pingback_enabled),
            NodeKind::Gbobject(g) => Ok(g.pingback_enabled),
            _ => Err(GraphError::WrongKind {
                nid,
                expected: "Nodetype or Gbobject",
                actual: node.kind.type_name(),
            }),
        }
    }

    /// Writes a new status. A hidden record stays hidden.
    pub fn set_status(&mut self, nid: Nid, status: Status) -> Result<()> {
        let from = self.publication_of(nid)?.status;
        self.update_node(nid, |node| {
            if let Some(publication) = node.publication_mut() {
                publication.status = status;
            }
        })?;
        debug!(%nid, %from, to = %status, "status changed");
        Ok(())
    }

    /// Stamps `last_update`.
    pub fn touch(&mut self, nid: Nid, now: DateTime<Utc>) -> Result<()> {
        self.publication_of(nid)?;
        self.update_node(nid, |node| {
            if let Some(publication) = node.publication_mut() {
                publication.last_update = now;
            }
        })
    }

    /// Visible records of the same family as `like`, newest first.
    fn published_like(&self, like: &Node, now: DateTime<Utc>) -> Vec<&Node> {
        let mut published: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| same_family(n, like))
            .filter(|n| n.publication().is_some_and(|p| p.is_visible(now)))
            .collect();
        published.sort_by_key(|n| {
            (
                std::cmp::Reverse(n.publication().map(|p| p.creation_date)),
                std::cmp::Reverse(n.nid),
            )
        });
        published
    }

    /// Published Nodetypes, newest first.
    pub fn published_nodetypes(&self, now: DateTime<Utc>) -> Vec<Nid> {
        let mut published: Vec<(DateTime<Utc>, Nid)> = self
            .nodes
            .values()
            .filter_map(|n| n.as_nodetype().map(|nt| (&nt.publication, n.nid)))
            .filter(|(p, _)| p.is_visible(now))
            .map(|(p, nid)| (p.creation_date, nid))
            .collect();
        published.sort_by(|a, b| b.cmp(a));
        published.into_iter().map(|(_, nid)| nid).collect()
    }

    /// The nearest published record created before this one.
    ///
    /// Ordering is by creation date, ties broken by Nid.
    pub fn previous_nodetype(&self, nid: Nid, now: DateTime<Utc>) -> Result<Option<Nid>> {
        let node = self.node(nid)?;
        let key = (self.publication_of(nid)?.creation_date, nid);
        Ok(self
            .published_like(node, now)
            .into_iter()
            .filter_map(|n| n.publication().map(|p| ((p.creation_date, n.nid), n.nid)))
            .filter(|(k, _)| *k < key)
            .max_by_key(|(k, _)| *k)
            .map(|(_, nid)| nid))
    }

    /// The nearest published record created after this one.
    pub fn next_nodetype(&self, nid: Nid, now: DateTime<Utc>) -> Result<Option<Nid>> {
        let node = self.node(nid)?;
        let key = (self.publication_of(nid)?.creation_date, nid);
        Ok(self
            .published_like(node, now)
            .into_iter()
            .filter_map(|n| n.publication().map(|p| ((p.creation_date, n.nid), n.nid)))
            .filter(|(k, _)| *k > key)
            .min_by_key(|(k, _)| *k)
            .map(|(_, nid)| nid))
    }

    /// Related records in either direction that are currently visible.
    pub fn related_published(&self, nid: Nid, now: DateTime<Utc>) -> Result<Vec<Nid>> {
        let node = self.node(nid)?;
        let outgoing: &[Nid] = match &node.kind {
            NodeKind::Nodetype(n) => &n.related,
            NodeKind::Gbobject(g) => &g.related,
            _ => &[],
        };

        let mut related: Vec<Nid> = outgoing.to_vec();
        for other in self.nodes.values() {
            let links_back = match &other.kind {
                NodeKind::Nodetype(n) => n.related.contains(&nid),
                NodeKind::Gbobject(g) => g.related.contains(&nid),
                _ => false,
            };
            if links_back && !related.contains(&other.nid) {
                related.push(other.nid);
            }
        }

        related.retain(|r| {
            self.get_node(*r)
                .and_then(Node::publication)
                .is_some_and(|p| p.is_visible(now))
        });
        related.sort();
        Ok(related)
    }

    /// Content rendered to HTML paragraphs unless it already contains them.
    pub fn html_content(&self, nid: Nid) -> Result<String> {
        let node = self.node(nid)?;
        let content = content_of(node).unwrap_or_default();
        if content.contains("</p>") {
            Ok(content.to_string())
        } else {
            Ok(linebreaks(content))
        }
    }

    /// Number of words in the content, ignoring markup.
    pub fn word_count(&self, nid: Nid) -> Result<usize> {
        let node = self.node(nid)?;
        let content = content_of(node).unwrap_or_default();
        Ok(strip_tags(content).split_whitespace().count())
    }
}
