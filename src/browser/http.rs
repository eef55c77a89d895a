//! Static rendering engine backed by plain HTTP GET requests.
//!
//! Scripts are never executed, so this engine only suits endpoints whose
//! payload is present in the served markup. It exists for hosts where no
//! Chromium binary is available.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::{Browser, BrowserError, BrowserSession};

/// Static GET-based engine.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    user_agent: String,
}

impl HttpBrowser {
    /// Creates an engine presenting `user_agent` on every request.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        // A client per session keeps cookie jars isolated between tasks.
        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .cookie_store(true)
            .gzip(true)
            .build()
            .map_err(BrowserError::session)?;
        Ok(Box::new(HttpSession {
            client,
            current: None,
        }))
    }
}

struct LoadedPage {
    url: String,
    body: String,
}

struct HttpSession {
    client: Client,
    current: Option<LoadedPage>,
}

impl HttpSession {
    fn loaded(&self) -> Result<&LoadedPage, BrowserError> {
        self.current
            .as_ref()
            .ok_or_else(|| BrowserError::session("no page loaded"))
    }
}

fn validate_url(url: &str) -> Result<(), BrowserError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(BrowserError::InvalidUrl {
            url: url.to_string(),
        }),
    }
}

/// Returns true when `selector` matches at least one element of `html`.
fn document_matches(html: &str, selector: &str) -> Result<bool, BrowserError> {
    let parsed = Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;
    let document = Html::parse_document(html);
    Ok(document.select(&parsed).next().is_some())
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        validate_url(url)?;
        self.current = None;

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrowserError::timeout(url, "navigation", timeout)
                } else {
                    BrowserError::navigation(url, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::navigation(url, format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                BrowserError::timeout(url, "navigation", timeout)
            } else {
                BrowserError::navigation(url, e)
            }
        })?;
        debug!(url = %url, bytes = body.len(), "page fetched");

        self.current = Some(LoadedPage {
            url: url.to_string(),
            body,
        });
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let page = self.loaded()?;
        // A static document never changes; a missing marker is final for this load.
        if document_matches(&page.body, selector)? {
            Ok(())
        } else {
            Err(BrowserError::timeout(page.url.as_str(), selector, timeout))
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.loaded()?.body.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        Ok(())
    }
}
