//! Spam checkers consulted by the comment moderator.

use tracing::warn;

use super::UnknownBackendError;
use crate::discussion::Discussion;

/// Decides whether a discussion record is spam.
pub trait SpamChecker: Send + Sync {
    fn name(&self) -> &str;

    fn is_spam(&self, discussion: &Discussion) -> bool;
}

/// Flags everything. Useful for locking down a site.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllIsSpam;

impl SpamChecker for AllIsSpam {
    fn name(&self) -> &str {
        "all_is_spam"
    }

    fn is_spam(&self, _discussion: &Discussion) -> bool {
        true
    }
}

/// Flags bodies or author URLs containing any listed keyword.
#[derive(Debug, Clone, Default)]
pub struct KeywordChecker {
    keywords: Vec<String>,
}

impl KeywordChecker {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }
}

impl SpamChecker for KeywordChecker {
    fn name(&self) -> &str {
        "keywords"
    }

    fn is_spam(&self, discussion: &Discussion) -> bool {
        let body = discussion.body.to_lowercase();
        let url = discussion.url.as_deref().unwrap_or_default().to_lowercase();
        self.keywords
            .iter()
            .any(|k| body.contains(k.as_str()) || url.contains(k.as_str()))
    }
}

const DEFAULT_SPAM_KEYWORDS: &[&str] = &["viagra", "casino", "payday loan"];

/// Looks up a spam checker by name.
pub fn try_spam_checker(name: &str) -> Result<Box<dyn SpamChecker>, UnknownBackendError> {
    match name {
        "all_is_spam" => Ok(Box::new(AllIsSpam)),
        "keywords" => Ok(Box::new(KeywordChecker::new(DEFAULT_SPAM_KEYWORDS.iter().copied()))),
        other => Err(UnknownBackendError {
            kind: "spam checker",
            name: other.to_string(),
        }),
    }
}

/// Looks up a spam checker by name. Unknown names log a warning and yield
/// no checker.
pub fn get_spam_checker(name: &str) -> Option<Box<dyn SpamChecker>> {
    match try_spam_checker(name) {
        Ok(checker) => Some(checker),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Every checker that could be resolved from `names`.
pub fn get_spam_checkers<S: AsRef<str>>(names: &[S]) -> Vec<Box<dyn SpamChecker>> {
    names
        .iter()
        .filter_map(|name| get_spam_checker(name.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discussion::NewDiscussion;
    use crate::ontology::Nid;
    use chrono::Utc;

    #[test]
    fn test_unknown_checker_is_skipped() {
        assert!(get_spam_checker("mymodule.myclass").is_none());
        let checkers = get_spam_checkers(&["all_is_spam", "nope"]);
        assert_eq!(checkers.len(), 1);
        assert_eq!(checkers[0].name(), "all_is_spam");
    }

    #[test]
    fn test_keyword_checker() {
        let checker = KeywordChecker::new(["casino"]);
        let ham = NewDiscussion::comment("bob", "Nice write-up").into_discussion(1, Nid(1), Utc::now());
        let spam = NewDiscussion::comment("eve", "Best CASINO deals").into_discussion(2, Nid(1), Utc::now());
        assert!(!checker.is_spam(&ham));
        assert!(checker.is_spam(&spam));
    }
}
