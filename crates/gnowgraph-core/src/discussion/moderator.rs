use chrono::{DateTime, Utc};
use tracing::info;

use super::{Flag, NewDiscussion};
use crate::backends::{get_spam_checkers, SpamChecker};
use crate::config::{BackendsConfig, PublicationConfig};
use crate::graph::{Graph, GraphError};
use crate::ontology::Nid;

/// Applies the comment policy of a site: auto-closing, auto-moderation and
/// spam checking.
pub struct CommentModerator {
    auto_close_after: Option<u32>,
    auto_moderate: bool,
    spam_checkers: Vec<Box<dyn SpamChecker>>,
}

impl std::fmt::Debug for CommentModerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentModerator")
            .field("auto_close_after", &self.auto_close_after)
            .field("auto_moderate", &self.auto_moderate)
            .field(
                "spam_checkers",
                &self.spam_checkers.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for CommentModerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentModerator {
    pub fn new() -> Self {
        Self {
            auto_close_after: None,
            auto_moderate: false,
            spam_checkers: Vec::new(),
        }
    }

    pub fn from_config(publication: &PublicationConfig, backends: &BackendsConfig) -> Self {
        Self {
            auto_close_after: publication.auto_close_comments_after,
            auto_moderate: publication.auto_moderate_comments,
            spam_checkers: get_spam_checkers(&backends.spam_checkers),
        }
    }

    pub fn with_auto_close_after(mut self, days: u32) -> Self {
        self.auto_close_after = Some(days);
        self
    }

    pub fn with_auto_moderate(mut self, auto_moderate: bool) -> Self {
        self.auto_moderate = auto_moderate;
        self
    }

    pub fn with_spam_checker(mut self, checker: Box<dyn SpamChecker>) -> Self {
        self.spam_checkers.push(checker);
        self
    }

    /// Whether a new comment may be posted on `target` at `now`.
    pub fn allow(&self, graph: &Graph, target: Nid, now: DateTime<Utc>) -> Result<bool, GraphError> {
        graph.comments_are_open(target, now, self.auto_close_after)
    }

    /// Decides whether a stored comment goes to moderation. Spam is flagged
    /// on the way.
    pub fn moderate(&self, graph: &mut Graph, id: u64) -> Result<bool, GraphError> {
        if self.auto_moderate {
            return Ok(true);
        }
        let Some(discussion) = graph.discussion(id) else {
            return Err(GraphError::Invalid(format!("no discussion with id {}", id)));
        };
        if self.spam_checkers.iter().any(|c| c.is_spam(discussion)) {
            graph.flag_discussion(id, Flag::Spam)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Posts a comment and runs moderation on it. Returns the record id, or
    /// `None` when comments are closed.
    pub fn post_comment(
        &self,
        graph: &mut Graph,
        target: Nid,
        comment: NewDiscussion,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, GraphError> {
        if !self.allow(graph, target, now)? {
            info!(%target, "comments are closed");
            return Ok(None);
        }
        let id = graph.add_discussion(target, comment, now)?;
        if self.moderate(graph, id)? {
            graph.set_discussion_public(id, false)?;
        }
        Ok(Some(id))
    }
}
