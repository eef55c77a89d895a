//! Shared fixtures for integration tests.
//!
//! [`ScriptedBrowser`] is an in-process rendering engine whose behavior is
//! scripted per URL. It counts navigations per URL and tracks how many
//! sessions are open at once, so tests can assert retry bounds and the
//! concurrency bound without a real browser or network.

#![allow(dead_code)]

pub mod socket_guard;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use article_harvester::{Browser, BrowserError, BrowserSession};
use async_trait::async_trait;

/// Behavior of one scripted URL.
#[derive(Debug, Clone)]
pub enum Script {
    /// Navigation succeeds, markers are present, snapshot returns the HTML.
    Page(String),
    /// Every navigation times out.
    NavigationTimeout,
    /// Navigation succeeds but marker waits always time out.
    MarkerTimeout,
    /// The first `failures` navigations time out, later ones load the HTML.
    Flaky { failures: usize, html: String },
    /// Navigation panics.
    Panic,
}

#[derive(Debug, Default)]
struct State {
    scripts: Mutex<HashMap<String, Script>>,
    navigations: Mutex<HashMap<String, usize>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    open_now: AtomicUsize,
    max_open: AtomicUsize,
}

/// Scripted in-process [`Browser`].
#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    state: Arc<State>,
    latency: Duration,
    refuse_sessions: bool,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every navigation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every `open_session` fail.
    pub fn refusing_sessions(mut self) -> Self {
        self.refuse_sessions = true;
        self
    }

    pub fn script(self, url: impl Into<String>, script: Script) -> Self {
        self.state
            .scripts
            .lock()
            .unwrap()
            .insert(url.into(), script);
        self
    }

    pub fn page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.script(url, Script::Page(html.into()))
    }

    /// Navigations issued for `url` so far.
    pub fn navigations(&self, url: &str) -> usize {
        self.state
            .navigations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Navigations issued for any URL so far.
    pub fn total_navigations(&self) -> usize {
        self.state.navigations.lock().unwrap().values().sum()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open sessions observed.
    pub fn max_concurrent_sessions(&self) -> usize {
        self.state.max_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.refuse_sessions {
            return Err(BrowserError::session("scripted refusal"));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.state.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_open.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
            latency: self.latency,
            loaded: None,
        }))
    }
}

struct ScriptedSession {
    state: Arc<State>,
    latency: Duration,
    loaded: Option<(String, Script)>,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.loaded = None;
        let attempt = {
            let mut navigations = self.state.navigations.lock().unwrap();
            let count = navigations.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let script = self.state.scripts.lock().unwrap().get(url).cloned();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match script {
            None => Err(BrowserError::navigation(url, "no script for url")),
            Some(Script::NavigationTimeout) => {
                Err(BrowserError::timeout(url, "navigation", timeout))
            }
            Some(Script::Flaky { failures, .. }) if attempt <= failures => {
                Err(BrowserError::timeout(url, "navigation", timeout))
            }
            Some(Script::Panic) => panic!("scripted panic while navigating to {url}"),
            Some(script) => {
                self.loaded = Some((url.to_string(), script));
                Ok(())
            }
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        match &self.loaded {
            Some((url, Script::MarkerTimeout)) => {
                Err(BrowserError::timeout(url.as_str(), selector, timeout))
            }
            Some(_) => Ok(()),
            None => Err(BrowserError::session("no page loaded")),
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        match &self.loaded {
            Some((_, Script::Page(html) | Script::Flaky { html, .. })) => Ok(html.clone()),
            Some((url, _)) => Err(BrowserError::Snapshot {
                url: url.clone(),
                reason: "scripted page has no content".to_string(),
            }),
            None => Err(BrowserError::session("no page loaded")),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.state.open_now.fetch_sub(1, Ordering::SeqCst);
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A detail page in the production layout with enough text to validate.
pub fn article_page(title: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        r#"<html><head><title>{title}</title></head><body>
            <div class="render-detail-title">{title}</div>
            <div class="render-detail-content">{body}</div>
        </body></html>"#
    )
}

/// Paragraph text comfortably above the minimum article length.
pub fn long_paragraph(seed: &str) -> String {
    format!("{seed}: {}", "内容".repeat(40))
}

/// A detail page titled `title` with one long paragraph.
pub fn valid_article(title: &str) -> String {
    let paragraph = long_paragraph(title);
    article_page(title, &[paragraph.as_str()])
}

/// A list endpoint body wrapping `urls` in non-JSON noise.
pub fn list_body(urls: &[&str]) -> String {
    let records: Vec<String> = urls
        .iter()
        .map(|u| format!(r#"{{"url":"{u}","title":"t","publishTime":"2024-01-01"}}"#))
        .collect();
    format!(
        "<html><body><pre>[{}]</pre></body></html>",
        records.join(",")
    )
}
