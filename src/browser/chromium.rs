//! Headless Chromium engine driven over the DevTools protocol.
//!
//! One Chromium process serves the whole run. Every session gets its own
//! browser context (the CDP equivalent of an incognito profile) holding a
//! single page; closing the session closes the page and disposes the context.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use futures_util::StreamExt;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{Browser, BrowserError, BrowserSession};

/// Interval between two marker lookups while waiting.
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct ChromiumInner {
    browser: RwLock<CdpBrowser>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

/// Headless Chromium engine.
///
/// Cheap to clone; clones share the same browser process.
#[derive(Clone)]
pub struct ChromiumBrowser {
    inner: Arc<ChromiumInner>,
}

impl std::fmt::Debug for ChromiumBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumBrowser").finish_non_exhaustive()
    }
}

impl ChromiumBrowser {
    /// Launches a headless Chromium process.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - User-Agent presented by every page
    /// * `executable` - Explicit Chrome/Chromium binary; auto-detected when `None`
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] if the configuration is rejected or the
    /// process cannot be started.
    #[instrument(skip(user_agent))]
    pub async fn launch(
        user_agent: &str,
        executable: Option<PathBuf>,
    ) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg(format!("--user-agent={user_agent}"));
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|reason| BrowserError::Launch { reason })?;

        let (browser, mut handler) =
            CdpBrowser::launch(config)
                .await
                .map_err(|e| BrowserError::Launch {
                    reason: e.to_string(),
                })?;

        // The CDP connection only makes progress while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "chromium handler event error");
                }
            }
            debug!("chromium handler stream ended");
        });

        info!("headless chromium launched");
        Ok(Self {
            inner: Arc::new(ChromiumInner {
                browser: RwLock::new(browser),
                handler: Mutex::new(Some(handler_task)),
            }),
        })
    }

    /// Closes the browser process and stops the handler task.
    pub async fn shutdown(&self) {
        {
            let mut browser = self.inner.browser.write().await;
            if let Err(e) = browser.close().await {
                warn!(error = %e, "failed to close chromium");
            }
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "failed to reap chromium process");
            }
        }
        if let Some(handle) = self.inner.handler.lock().await.take() {
            handle.abort();
        }
        info!("headless chromium closed");
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let browser = self.inner.browser.read().await;

        let context = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(BrowserError::session)?;
        let context_id = context.result.browser_context_id.clone();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(BrowserError::session)?;

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(dispose) = browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await
                {
                    warn!(error = %dispose, "failed to dispose orphaned browser context");
                }
                return Err(BrowserError::session(e));
            }
        };

        Ok(Box::new(ChromiumSession {
            inner: Arc::clone(&self.inner),
            page: Some(page),
            context_id,
            current_url: String::new(),
        }))
    }
}

struct ChromiumSession {
    inner: Arc<ChromiumInner>,
    page: Option<Page>,
    context_id: BrowserContextId,
    current_url: String,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::session("page already closed"))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.current_url = url.to_string();
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::navigation(url, e)),
            Err(_) => Err(BrowserError::timeout(url, "navigation", timeout)),
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let page = self.page()?;
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(MARKER_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| BrowserError::timeout(self.current_url.as_str(), selector, timeout))
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        let page = self.page()?;
        page.content().await.map_err(|e| BrowserError::Snapshot {
            url: self.current_url.clone(),
            reason: e.to_string(),
        })
    }

    async fn close(mut self: Box<Self>) -> Result<(), BrowserError> {
        let page_result = match self.page.take() {
            Some(page) => page.close().await.map_err(BrowserError::session),
            None => Ok(()),
        };

        let browser = self.inner.browser.read().await;
        let dispose_result = browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await
            .map(|_| ())
            .map_err(BrowserError::session);

        page_result.and(dispose_result)
    }
}
