use reqwest::Url;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

use super::xmlrpc::{self, Value};
use super::{FetchedPage, PingReply, PingTransport};
use crate::graph::{Graph, GraphError};
use crate::locator::Locator;
use crate::ontology::Nid;

/// Sends pingbacks to the external pages a nodetype links to.
pub struct ExternalUrlsPinger {
    locator: Locator,
    transport: Arc<dyn PingTransport>,
}

impl ExternalUrlsPinger {
    pub fn new(locator: Locator, transport: Arc<dyn PingTransport>) -> Self {
        Self { locator, transport }
    }

    /// Whether `url` points at another host than the site.
    pub fn is_external_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => authority(&parsed, host) != self.locator.domain(),
                None => false,
            },
            Err(_) => false,
        }
    }

    /// External link targets in rendered HTML, in document order.
    pub fn find_external_urls(&self, html: &str) -> Vec<String> {
        let selector = match Selector::parse("a[href]") {
            Ok(selector) => selector,
            Err(_) => return Vec::new(),
        };
        let document = Html::parse_fragment(html);
        let mut urls: Vec<String> = Vec::new();
        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if self.is_external_url(href) && !urls.iter().any(|u| u == href) {
                urls.push(href.to_string());
            }
        }
        urls
    }

    /// Pingback server advertised by a page, through the `X-Pingback`
    /// header or a `<link rel="pingback">` element. Relative server URLs
    /// are resolved against the page's origin. Non-text pages have none.
    pub fn find_pingback_server(&self, page_url: &str, page: &FetchedPage) -> Option<String> {
        let content_type = page.header("content-type").unwrap_or_default().to_lowercase();
        if !content_type.contains("text/") {
            return None;
        }

        let server = match page.header("x-pingback") {
            Some(server) if !server.trim().is_empty() => server.trim().to_string(),
            _ => find_pingback_href(&page.body)?,
        };

        if Url::parse(&server).is_ok() {
            return Some(server);
        }
        let page = Url::parse(page_url).ok()?;
        let host = page.host_str()?;
        Some(format!("{}://{}{}", page.scheme(), authority(&page, host), server))
    }

    async fn pingback(&self, server: &str, source: &str, target: &str) -> PingReply {
        let body = xmlrpc::method_call("pingback.ping", &[source, target]);
        let outcome = match self.transport.post_xml(server, body).await {
            Ok(response) => xmlrpc::parse_response(&response),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(Value::String(message)) => PingReply::ok(message),
            Ok(other) => PingReply::ok(format!("{:?}", other)),
            Err(e) => {
                debug!(%target, "pingback failed: {}", e);
                PingReply::error(format!("{} cannot be pinged.", target))
            }
        }
    }

    /// Pings back every external page linked from a nodetype's content that
    /// advertises a pingback server. Pages that cannot be fetched are
    /// skipped.
    pub async fn ping(&self, graph: &Graph, nid: Nid) -> Result<Vec<(String, PingReply)>, GraphError> {
        let source = self.locator.locate_absolute(graph, nid)?;
        let urls = self.find_external_urls(&graph.html_content(nid)?);

        let mut pingable = Vec::new();
        for url in urls {
            match self.transport.fetch(&url).await {
                Ok(page) => {
                    if let Some(server) = self.find_pingback_server(&url, &page) {
                        pingable.push((url, server));
                    }
                }
                Err(e) => debug!(%url, "cannot fetch: {}", e),
            }
        }

        let mut results = Vec::with_capacity(pingable.len());
        for (url, server) in pingable {
            let reply = self.pingback(&server, &source, &url).await;
            info!("{} : {}", url, reply.message);
            results.push((url, reply));
        }
        Ok(results)
    }
}

/// `host[:port]` of a parsed URL.
fn authority(url: &Url, host: &str) -> String {
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn find_pingback_href(html: &str) -> Option<String> {
    let selector = Selector::parse("link[rel][href]").ok()?;
    let document = Html::parse_document(html);
    let href = document
        .select(&selector)
        .filter(|link| {
            link.value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("pingback")))
                .unwrap_or(false)
        })
        .find_map(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string());
    href
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::ping::PingError;
    use std::collections::HashMap;

    struct NoNetwork;

    #[async_trait]
    impl PingTransport for NoNetwork {
        async fn post_xml(&self, url: &str, _body: String) -> Result<String, PingError> {
            Err(PingError::Network(url.to_string()))
        }

        async fn fetch(&self, url: &str) -> Result<FetchedPage, PingError> {
            Err(PingError::Network(url.to_string()))
        }
    }

    fn pinger() -> ExternalUrlsPinger {
        ExternalUrlsPinger::new(Locator::new("http", "example.com"), Arc::new(NoNetwork))
    }

    #[test]
    fn test_external_urls() {
        let html = r#"<p><a href="http://example.com/nodetypes/">home</a>
            <a href="http://other.org/post/">other</a>
            <a class="x" href='https://third.net/a'>third</a>
            <a href="/relative/">rel</a>
            <a href="http://other.org/post/">again</a></p>"#;
        assert_eq!(
            pinger().find_external_urls(html),
            vec!["http://other.org/post/".to_string(), "https://third.net/a".to_string()]
        );
    }

    #[test]
    fn test_external_urls_ignore_commented_markup() {
        let html = r#"<!-- <a href="http://hidden.org/">x</a> -->
            <p title="<a href='http://attr.org/'>">text</p>
            <A HREF="http://upper.org/">caps</A>"#;
        assert_eq!(
            pinger().find_external_urls(html),
            vec!["http://upper.org/".to_string()]
        );
    }

    #[test]
    fn test_pingback_href_with_multiple_rel_values() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <link href="/rpc" rel="Pingback nofollow">
            </head></html>"#;
        assert_eq!(find_pingback_href(html), Some("/rpc".to_string()));
        assert_eq!(find_pingback_href("<p>no links</p>"), None);
    }

    #[test]
    fn test_pingback_server_discovery() {
        let p = pinger();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html; charset=utf-8".to_string());
        let page = FetchedPage {
            headers: headers.clone(),
            body: r#"<head><link rel="pingback" href="/xmlrpc/" /></head>"#.to_string(),
        };
        assert_eq!(
            p.find_pingback_server("http://other.org:8080/post/", &page),
            Some("http://other.org:8080/xmlrpc/".to_string())
        );

        let mut with_header = page.clone();
        with_header
            .headers
            .insert("x-pingback".to_string(), "http://rpc.other.org/".to_string());
        assert_eq!(
            p.find_pingback_server("http://other.org/post/", &with_header),
            Some("http://rpc.other.org/".to_string())
        );

        let mut image = page;
        image.headers.insert("content-type".to_string(), "image/png".to_string());
        assert_eq!(p.find_pingback_server("http://other.org/a.png", &image), None);
    }
}
