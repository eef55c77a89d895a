//! Named crawl tunables shared by the fetchers, the pool, and the orchestrator.
//!
//! Every timing constant the pipeline waits on lives here so it can be tuned
//! from the config file and shortened in tests.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CONTENT_SELECTOR, DEFAULT_LIST_URL_TEMPLATE, DEFAULT_MARKER_TIMEOUT,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_PARAGRAPH_SELECTOR,
    DEFAULT_RETRY_BACKOFF, DEFAULT_TITLE_SELECTOR, DEFAULT_TOPIC_PAUSE, DEFAULT_WAIT_MARKERS,
};
use crate::user_agent;

/// Structural signatures used to recognize and parse a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMarkers {
    /// Selectors that must all match before the page is considered rendered.
    pub wait_markers: Vec<String>,
    /// Selector of the title region.
    pub title: String,
    /// Selector of the content region.
    pub content: String,
    /// Selector of paragraph elements, evaluated inside the content region.
    pub paragraph: String,
}

impl Default for PageMarkers {
    fn default() -> Self {
        Self {
            wait_markers: DEFAULT_WAIT_MARKERS.iter().map(ToString::to_string).collect(),
            title: DEFAULT_TITLE_SELECTOR.to_string(),
            content: DEFAULT_CONTENT_SELECTOR.to_string(),
            paragraph: DEFAULT_PARAGRAPH_SELECTOR.to_string(),
        }
    }
}

/// Crawl configuration.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `retry_backoff`: 2 seconds
/// - `topic_pause`: 2 seconds
/// - `navigation_timeout`: 15 seconds
/// - `marker_timeout`: 10 seconds
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Navigation attempts per detail page, initial attempt included.
    pub max_attempts: u32,
    /// Fixed sleep between attempts after a timeout.
    pub retry_backoff: Duration,
    /// Sleep between two processed topics.
    pub topic_pause: Duration,
    /// Timeout for one page navigation.
    pub navigation_timeout: Duration,
    /// Timeout for each wait marker.
    pub marker_timeout: Duration,
    /// List endpoint template containing `{id}`.
    pub list_url_template: String,
    /// Detail page structure.
    pub markers: PageMarkers,
    /// User agent presented by every rendering engine.
    pub user_agent: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            topic_pause: DEFAULT_TOPIC_PAUSE,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            marker_timeout: DEFAULT_MARKER_TIMEOUT,
            list_url_template: DEFAULT_LIST_URL_TEMPLATE.to_string(),
            markers: PageMarkers::default(),
            user_agent: user_agent::default_browser_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_documented_values() {
        let settings = CrawlSettings::default();
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.retry_backoff, Duration::from_secs(2));
        assert_eq!(settings.topic_pause, Duration::from_secs(2));
        assert_eq!(settings.navigation_timeout, Duration::from_secs(15));
        assert_eq!(settings.marker_timeout, Duration::from_secs(10));
        assert!(settings.list_url_template.contains("{id}"));
    }

    #[test]
    fn test_default_markers_wait_for_title_and_content() {
        let markers = PageMarkers::default();
        assert_eq!(markers.wait_markers.len(), 2);
        assert!(markers.wait_markers[0].contains("title"));
        assert!(markers.wait_markers[1].contains("content"));
        assert_eq!(markers.title, "div.render-detail-title");
        assert_eq!(markers.content, "div.render-detail-content");
        assert_eq!(markers.paragraph, "p");
    }
}
