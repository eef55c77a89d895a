//! Topic list endpoint rendering and item reference extraction.
//!
//! The list endpoint returns a JSON array wrapped in arbitrary non-JSON
//! text (a script context, or the viewer markup a browser puts around a
//! JSON document). [`parse_item_references`] locates the array, normalizes
//! escaped slashes, and keeps every record that carries a URL, in order.
//!
//! [`ListFetcher::fetch`] never fails: every failure mode is logged and
//! degrades to an empty item list so the orchestrator moves on.

mod record;

pub use record::ListRecord;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::browser::{Browser, BrowserError, SessionGuard};
use crate::constants::TOPIC_ID_PLACEHOLDER;

/// First `[` through last `]`, spanning lines.
static ARRAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?s)\[.*\]").expect("array regex is valid") // Static pattern, safe to panic
});

/// Characters of an unparsable payload kept in the diagnostic.
const EXCERPT_CHARS: usize = 200;

/// A discovered detail page awaiting extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemReference {
    /// Detail page URL.
    pub url: String,
}

impl ItemReference {
    /// Creates a reference to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Reasons a list endpoint yields no items.
#[derive(Debug, Error)]
pub enum ListError {
    /// The endpoint template does not produce a valid URL.
    #[error("invalid list endpoint {url}")]
    InvalidEndpoint {
        /// The rejected URL.
        url: String,
    },

    /// The endpoint could not be rendered.
    #[error("failed to render list endpoint: {0}")]
    Render(#[from] BrowserError),

    /// No bracket-delimited array appears in the body.
    #[error("no JSON array found in list body")]
    NoArray,

    /// The located array is not valid JSON.
    #[error("list payload is not valid JSON: {source} (excerpt: {excerpt})")]
    Json {
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
        /// Start of the offending payload.
        excerpt: String,
    },

    /// The payload parsed but is not an array.
    #[error("list payload is not an array")]
    NotAnArray,
}

/// Extracts item references from a rendered list body.
///
/// Records without a non-empty string `url` are skipped; the remaining
/// references keep their original order.
///
/// # Errors
///
/// Returns [`ListError::NoArray`], [`ListError::Json`], or
/// [`ListError::NotAnArray`] when the body holds no usable array.
pub fn parse_item_references(body: &str) -> Result<Vec<ItemReference>, ListError> {
    let found = ARRAY_PATTERN.find(body).ok_or(ListError::NoArray)?;
    let payload = found.as_str().replace("\\/", "/");

    let value: Value = serde_json::from_str(&payload).map_err(|source| ListError::Json {
        source,
        excerpt: payload.chars().take(EXCERPT_CHARS).collect(),
    })?;
    let Value::Array(records) = value else {
        return Err(ListError::NotAnArray);
    };

    let total = records.len();
    let items: Vec<ItemReference> = records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<ListRecord>(record).ok())
        .filter_map(ListRecord::into_reference)
        .collect();

    debug!(records = total, items = items.len(), "list payload parsed");
    Ok(items)
}

/// Renders a topic's list endpoint and extracts its item references.
#[derive(Clone)]
pub struct ListFetcher {
    browser: Arc<dyn Browser>,
    url_template: String,
    navigation_timeout: Duration,
}

impl std::fmt::Debug for ListFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListFetcher")
            .field("engine", &self.browser.name())
            .field("url_template", &self.url_template)
            .field("navigation_timeout", &self.navigation_timeout)
            .finish()
    }
}

impl ListFetcher {
    /// Creates a list fetcher.
    ///
    /// # Arguments
    ///
    /// * `browser` - Engine used to render the endpoint
    /// * `url_template` - Endpoint template containing `{id}`
    /// * `navigation_timeout` - Deadline for rendering the endpoint
    pub fn new(
        browser: Arc<dyn Browser>,
        url_template: impl Into<String>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            browser,
            url_template: url_template.into(),
            navigation_timeout,
        }
    }

    /// Builds the list endpoint URL for `topic_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::InvalidEndpoint`] if the result is not a URL.
    pub fn list_url(&self, topic_id: &str) -> Result<String, ListError> {
        let url = self.url_template.replace(TOPIC_ID_PLACEHOLDER, topic_id);
        match Url::parse(&url) {
            Ok(_) => Ok(url),
            Err(_) => Err(ListError::InvalidEndpoint { url }),
        }
    }

    /// Fetches the ordered item references of `topic_id`.
    ///
    /// Never fails; every failure is logged and yields an empty list.
    #[instrument(skip(self))]
    pub async fn fetch(&self, topic_id: &str) -> Vec<ItemReference> {
        match self.try_fetch(topic_id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(topic_id, error = %e, "list endpoint yielded no items");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, topic_id: &str) -> Result<Vec<ItemReference>, ListError> {
        let url = self.list_url(topic_id)?;
        info!(url = %url, "fetching article list");
        let body = self.render(&url).await?;
        parse_item_references(&body)
    }

    async fn render(&self, url: &str) -> Result<String, BrowserError> {
        let mut session = SessionGuard::acquire(self.browser.as_ref(), url).await?;
        let result: Result<String, BrowserError> = async {
            session.navigate(url, self.navigation_timeout).await?;
            session.content().await
        }
        .await;
        session.release().await;
        result
    }
}
