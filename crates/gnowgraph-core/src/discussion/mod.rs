//! Discussions (comments, pingbacks, trackbacks) attached to publishable
//! nodes, and the moderation rules applied to them.

mod moderator;

pub use moderator::CommentModerator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::graph::{Graph, GraphError};
use crate::ontology::Nid;

/// Marks set on a discussion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    ModeratorApproval,
    Pingback,
    Trackback,
    Spam,
}

/// A comment-like record attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: u64,
    pub target: Nid,
    pub author: String,
    #[serde(default)]
    pub url: Option<String>,
    pub body: String,
    pub submit_date: DateTime<Utc>,
    pub is_public: bool,
    #[serde(default)]
    pub flags: Vec<Flag>,
}

impl Discussion {
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }
}

/// A discussion record before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiscussion {
    pub author: String,
    pub url: Option<String>,
    pub body: String,
    pub flags: Vec<Flag>,
}

impl NewDiscussion {
    pub fn comment(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            url: None,
            body: body.into(),
            flags: Vec::new(),
        }
    }

    /// A pingback from `source_url`, titled after the linking page.
    pub fn pingback(source_url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = source_url.into();
        Self {
            author: title.into(),
            url: Some(url.clone()),
            body: url,
            flags: vec![Flag::Pingback],
        }
    }

    pub fn trackback(source_url: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            author: String::new(),
            url: Some(source_url.into()),
            body: excerpt.into(),
            flags: vec![Flag::Trackback],
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub(crate) fn into_discussion(self, id: u64, target: Nid, now: DateTime<Utc>) -> Discussion {
        Discussion {
            id,
            target,
            author: self.author,
            url: self.url,
            body: self.body,
            submit_date: now,
            is_public: true,
            flags: self.flags,
        }
    }
}

/// Failures of the pingback receiving path. Each maps to the XML-RPC fault
/// code a pingback server reports.
#[derive(Debug, Error)]
pub enum PingbackError {
    #[error("the specified target URL does not exist: {0}")]
    TargetDoesNotExist(Nid),

    #[error("the specified target URL cannot be used as a target: {0}")]
    TargetIsNotPingbackEnabled(Nid),

    #[error("the pingback from {source_url} has already been registered")]
    AlreadyRegistered { source_url: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl PingbackError {
    pub fn fault_code(&self) -> i32 {
        match self {
            Self::TargetDoesNotExist(_) => 32,
            Self::TargetIsNotPingbackEnabled(_) => 33,
            Self::AlreadyRegistered { .. } => 48,
            Self::Graph(_) => 0,
        }
    }
}

impl Graph {
    /// Attaches a discussion record to a Nodetype or Gbobject.
    pub fn add_discussion(
        &mut self,
        target: Nid,
        new: NewDiscussion,
        now: DateTime<Utc>,
    ) -> Result<u64, GraphError> {
        self.expect_node(target, "Nodetype or Gbobject", |n| n.publication().is_some())?;
        let id = self.next_discussion_id();
        let discussion = new.into_discussion(id, target, now);
        debug!(id, %target, "added discussion");
        self.discussions_mut().push(discussion);
        Ok(id)
    }

    pub fn discussion(&self, id: u64) -> Option<&Discussion> {
        self.discussion_records().iter().find(|d| d.id == id)
    }

    /// Adds a flag to a discussion record.
    pub fn flag_discussion(&mut self, id: u64, flag: Flag) -> Result<(), GraphError> {
        let record = self
            .discussions_mut()
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| GraphError::Invalid(format!("no discussion with id {}", id)))?;
        if !record.flags.contains(&flag) {
            record.flags.push(flag);
        }
        Ok(())
    }

    /// Sets the public visibility of a discussion record.
    pub fn set_discussion_public(&mut self, id: u64, is_public: bool) -> Result<(), GraphError> {
        let record = self
            .discussions_mut()
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| GraphError::Invalid(format!("no discussion with id {}", id)))?;
        record.is_public = is_public;
        Ok(())
    }

    /// Public discussion records of a node.
    pub fn discussions(&self, target: Nid) -> Vec<&Discussion> {
        self.discussion_records()
            .iter()
            .filter(|d| d.target == target && d.is_public)
            .collect()
    }

    /// Public comments: records without flags or approved by a moderator.
    pub fn comments(&self, target: Nid) -> Vec<&Discussion> {
        self.discussions(target)
            .into_iter()
            .filter(|d| d.flags.is_empty() || d.has_flag(Flag::ModeratorApproval))
            .collect()
    }

    pub fn pingbacks(&self, target: Nid) -> Vec<&Discussion> {
        self.discussions(target)
            .into_iter()
            .filter(|d| d.has_flag(Flag::Pingback))
            .collect()
    }

    pub fn trackbacks(&self, target: Nid) -> Vec<&Discussion> {
        self.discussions(target)
            .into_iter()
            .filter(|d| d.has_flag(Flag::Trackback))
            .collect()
    }

    /// Records an incoming pingback from `source_url` to `target`.
    pub fn receive_pingback(
        &mut self,
        source_url: &str,
        source_title: &str,
        target: Nid,
        now: DateTime<Utc>,
    ) -> Result<u64, PingbackError> {
        if self.get_node(target).is_none() {
            return Err(PingbackError::TargetDoesNotExist(target));
        }
        if !self.pingback_enabled(target)? {
            return Err(PingbackError::TargetIsNotPingbackEnabled(target));
        }
        let duplicate = self
            .discussion_records()
            .iter()
            .any(|d| d.target == target && d.has_flag(Flag::Pingback) && d.url.as_deref() == Some(source_url));
        if duplicate {
            return Err(PingbackError::AlreadyRegistered {
                source_url: source_url.to_string(),
            });
        }
        Ok(self.add_discussion(target, NewDiscussion::pingback(source_url, source_title), now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{Metatype, Nodetype};

    #[test]
    fn test_discussion_views() {
        let now = Utc::now();
        let mut graph = Graph::new();
        let n = graph.create_nodetype("N", Nodetype::new("n")).unwrap();

        let plain = graph.add_discussion(n, NewDiscussion::comment("bob", "hi"), now).unwrap();
        let approved = graph.add_discussion(n, NewDiscussion::comment("ann", "ok"), now).unwrap();
        graph.flag_discussion(approved, Flag::ModeratorApproval).unwrap();
        graph
            .add_discussion(n, NewDiscussion::pingback("http://a.example/", "A"), now)
            .unwrap();
        graph
            .add_discussion(n, NewDiscussion::trackback("http://b.example/", "B"), now)
            .unwrap();
        let hidden = graph.add_discussion(n, NewDiscussion::comment("eve", "x"), now).unwrap();
        graph.set_discussion_public(hidden, false).unwrap();

        assert_eq!(graph.discussions(n).len(), 4);
        let comments: Vec<u64> = graph.comments(n).iter().map(|d| d.id).collect();
        assert_eq!(comments, vec![plain, approved]);
        assert_eq!(graph.pingbacks(n).len(), 1);
        assert_eq!(graph.trackbacks(n).len(), 1);
    }

    #[test]
    fn test_discussions_need_publishable_target() {
        let mut graph = Graph::new();
        let m = graph.create_metatype("M", Metatype::new("m")).unwrap();
        assert!(graph
            .add_discussion(m, NewDiscussion::comment("bob", "hi"), Utc::now())
            .is_err());
    }

    #[test]
    fn test_receive_pingback_faults() {
        let now = Utc::now();
        let mut graph = Graph::new();
        let open = graph.create_nodetype("Open", Nodetype::new("open")).unwrap();
        let mut closed_type = Nodetype::new("closed");
        closed_type.pingback_enabled = false;
        let closed = graph.create_nodetype("Closed", closed_type).unwrap();

        graph
            .receive_pingback("http://x.example/post", "Post", open, now)
            .unwrap();
        let again = graph.receive_pingback("http://x.example/post", "Post", open, now);
        assert_eq!(again.unwrap_err().fault_code(), 48);

        let refused = graph.receive_pingback("http://x.example/post", "Post", closed, now);
        assert_eq!(refused.unwrap_err().fault_code(), 33);

        let missing = graph.receive_pingback("http://x.example/post", "Post", Nid(99), now);
        assert_eq!(missing.unwrap_err().fault_code(), 32);
    }
}
