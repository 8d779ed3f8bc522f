//! Pluggable backends selected by name from configuration.
//!
//! An unknown backend name never fails the caller: the lookup logs a
//! warning and falls back (default shortener, or no spam checker).

mod error;
pub mod spam_checker;
pub mod url_shortener;

pub use error::UnknownBackendError;
pub use spam_checker::{get_spam_checker, get_spam_checkers, SpamChecker};
pub use url_shortener::{get_url_shortener, UrlShortener};
