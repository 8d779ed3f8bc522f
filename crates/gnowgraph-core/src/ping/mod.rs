//! Outbound pings: directory update notifications and pingbacks to the
//! external pages a nodetype links to.
//!
//! Every request carries its own timeout. A failing target is recorded in
//! the results and never aborts the rest of the batch.

mod directory;
mod external;
mod on_save;
pub mod xmlrpc;

pub use directory::{ping_directories, DirectoryPinger};
pub use external::ExternalUrlsPinger;
pub use on_save::{ping_on_save, SavePings};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::PingConfig;

/// Errors from a single outbound request.
#[derive(Debug, Error)]
pub enum PingError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i32, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PingError {
    fn from(err: reqwest::Error) -> Self {
        PingError::Network(err.to_string())
    }
}

/// Outcome of one ping, in the shape directories reply with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReply {
    pub message: String,
    pub flerror: bool,
}

impl PingReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            flerror: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            flerror: true,
        }
    }
}

/// A fetched page. Header names are lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FetchedPage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// HTTP seam used by the pingers.
#[async_trait]
pub trait PingTransport: Send + Sync {
    /// POSTs an XML-RPC request body and returns the response body.
    async fn post_xml(&self, url: &str, body: String) -> Result<String, PingError>;

    /// GETs a page.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, PingError>;
}

/// reqwest-backed transport with a per-request timeout.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            timeout,
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &PingConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), config.user_agent.clone())
    }
}

#[async_trait]
impl PingTransport for HttpTransport {
    async fn post_xml(&self, url: &str, body: String) -> Result<String, PingError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("content-type", "text/xml")
            .header("user-agent", &self.user_agent)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PingError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, PingError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header("user-agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PingError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        Ok(FetchedPage {
            headers,
            body: response.text().await?,
        })
    }
}
