//! Page Rendering Engine seam.
//!
//! A [`PageRenderer`] opens a [`RenderSession`] on a fully loaded page. The
//! session can scroll, run the DOM scan against the live document, and must
//! be [`RenderSession::close`]d exactly once; `close` consumes the box so a
//! second release does not type-check.

use super::browser_manager::{self, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use super::dom_scan::{dom_scan_script, DomScan};
use crate::core::error::ExtractError;
use crate::images::profile::PageLoadOptions;
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use url::Url;

#[async_trait]
pub trait PageRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Navigate to `url` and wait for load completion.
    async fn open(
        &self,
        url: &Url,
        options: &PageLoadOptions,
    ) -> Result<Box<dyn RenderSession>, ExtractError>;
}

#[async_trait]
pub trait RenderSession: Send {
    async fn scroll_to_bottom(&mut self, max_rounds: u32, pause: Duration) -> Result<(), ExtractError>;

    /// Evaluate the extraction function against the current document.
    async fn scan_dom(&mut self) -> Result<DomScan, ExtractError>;

    /// Release the underlying resources. Failures are logged, never returned.
    async fn close(self: Box<Self>);
}

/// Headless Chromium driven over CDP, one browser process per session.
#[derive(Debug, Default, Clone)]
pub struct ChromiumRenderer {
    /// Resolved lazily on each open when unset.
    executable: Option<String>,
}

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self {
            executable: browser_manager::find_chrome_executable(),
        }
    }
}

fn render_err(context: &str, e: impl std::fmt::Display) -> ExtractError {
    ExtractError::RenderFailure(format!("{}: {}", context, e))
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn open(
        &self,
        url: &Url,
        options: &PageLoadOptions,
    ) -> Result<Box<dyn RenderSession>, ExtractError> {
        let exe = self
            .executable
            .clone()
            .or_else(browser_manager::find_chrome_executable)
            .ok_or_else(|| {
                ExtractError::RenderFailure(
                    "No browser found. Install Chrome or Chromium, or set CHROME_EXECUTABLE."
                        .to_string(),
                )
            })?;

        info!("🌐 Rendering {} (browser: {})", url, exe);

        let config = browser_manager::build_headless_config(
            &exe,
            VIEWPORT_WIDTH,
            VIEWPORT_HEIGHT,
            options.navigation_timeout,
        )
        .map_err(|e| render_err("browser config", e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| render_err(&format!("failed to launch browser ({})", exe), e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
        });

        let loaded: Result<Page, ExtractError> = async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| render_err("failed to open tab", e))?;

            match tokio::time::timeout(options.navigation_timeout, page.goto(url.as_str())).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(render_err("navigation failed", e)),
                Err(_) => {
                    return Err(ExtractError::RenderFailure(format!(
                        "navigation timed out after {}ms",
                        options.navigation_timeout.as_millis()
                    )))
                }
            }

            browser_manager::wait_until_stable(&page, options.idle_quiet, options.idle_timeout)
                .await
                .map_err(|e| render_err("load wait failed", e))?;
            Ok(page)
        }
        .await;

        match loaded {
            Ok(page) => Ok(Box::new(ChromiumSession {
                browser,
                page,
                handler_task,
            })),
            Err(e) => {
                // No session exists yet; tear the browser down here.
                if let Err(close_err) = browser.close().await {
                    warn!("Browser close error (non-fatal): {}", close_err);
                }
                handler_task.abort();
                Err(e)
            }
        }
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn scroll_to_bottom(&mut self, max_rounds: u32, pause: Duration) -> Result<(), ExtractError> {
        browser_manager::scroll_to_bottom(&self.page, max_rounds, pause)
            .await
            .map_err(|e| render_err("scroll failed", e))
    }

    async fn scan_dom(&mut self) -> Result<DomScan, ExtractError> {
        let result = self
            .page
            .evaluate_expression(dom_scan_script())
            .await
            .map_err(|e| render_err("DOM scan failed", e))?;
        result
            .into_value::<DomScan>()
            .map_err(|e| render_err("DOM scan returned unexpected data", e))
    }

    async fn close(self: Box<Self>) {
        let ChromiumSession {
            mut browser,
            page,
            handler_task,
        } = *self;
        if let Err(e) = page.close().await {
            warn!("Tab close error (non-fatal): {}", e);
        }
        if let Err(e) = browser.close().await {
            error!("Browser close error: {}", e);
        }
        handler_task.abort();
    }
}
