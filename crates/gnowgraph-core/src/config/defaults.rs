//! Default values for gnowgraph configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Storage Defaults
// ============================================================================

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = ".gnow";

/// Default graph snapshot file name.
pub const DEFAULT_GRAPH_FILE: &str = "graph.json";

// ============================================================================
// Site Defaults
// ============================================================================

/// Default site domain used in absolute locators and short URLs.
pub const DEFAULT_SITE_DOMAIN: &str = "example.com";

/// Default protocol for absolute locators.
pub const DEFAULT_PROTOCOL: &str = "http";

/// Default site name.
pub const DEFAULT_SITE_NAME: &str = "gnowgraph";

// ============================================================================
// Publication Defaults
// ============================================================================

/// Comments stay open forever unless configured.
pub const DEFAULT_AUTO_CLOSE_COMMENTS_AFTER: Option<u32> = None;

/// Comments are not moderated automatically.
pub const DEFAULT_AUTO_MODERATE_COMMENTS: bool = false;

// ============================================================================
// Graph Defaults
// ============================================================================

/// Relations and attributes are not checked against their type's domain.
pub const DEFAULT_ENFORCE_SUBJECT_TYPES: bool = false;

/// Nodetypes may be created without authors.
pub const DEFAULT_REQUIRE_AUTHORS: bool = false;

// ============================================================================
// Ping Defaults
// ============================================================================

/// Directories notified when a nodetype is published.
pub const DEFAULT_PING_DIRECTORIES: &[&str] = &["http://rpc.pingomatic.com/"];

/// Per-request timeout for outbound pings, in seconds.
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 10;

/// Whether directories are pinged on save.
pub const DEFAULT_SAVE_PING_DIRECTORIES: bool = true;

/// Whether external URLs found in content are pinged on save.
pub const DEFAULT_SAVE_PING_EXTERNAL_URLS: bool = true;

/// User agent sent with outbound HTTP requests.
pub const DEFAULT_USER_AGENT: &str = concat!("gnowgraph/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Backend Defaults
// ============================================================================

/// Default URL shortener backend.
pub const DEFAULT_URL_SHORTENER: &str = "default";

/// No spam checker is configured by default.
pub const DEFAULT_SPAM_CHECKERS: &[&str] = &[];

/// Number of related items returned by the similarity index.
pub const DEFAULT_RELATED_LIMIT: usize = 5;
