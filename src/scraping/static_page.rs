use super::dom_scan::DomScan;
use super::renderer::{PageRenderer, RenderSession};
use crate::core::error::ExtractError;
use crate::images::profile::PageLoadOptions;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Fetches raw HTML and scans it without running any scripts.
///
/// Useful for server-rendered pages and for hosts without a browser. There is
/// no layout, so the geometry filter only sees declared `width`/`height`.
#[derive(Clone, Debug)]
pub struct StaticRenderer {
    client: reqwest::Client,
}

impl StaticRenderer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn open(
        &self,
        url: &Url,
        options: &PageLoadOptions,
    ) -> Result<Box<dyn RenderSession>, ExtractError> {
        info!("📄 Static fetch: {}", url);
        let response = self
            .client
            .get(url.as_str())
            .timeout(options.navigation_timeout)
            .send()
            .await
            .map_err(|e| ExtractError::RenderFailure(format!("fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Non-success status code: {}", status.as_u16());
            return Err(ExtractError::RenderFailure(format!(
                "upstream returned HTTP {}",
                status.as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ExtractError::RenderFailure(format!("body read failed: {}", e)))?;

        Ok(Box::new(StaticSession { html }))
    }
}

struct StaticSession {
    html: String,
}

#[async_trait]
impl RenderSession for StaticSession {
    async fn scroll_to_bottom(&mut self, _max_rounds: u32, _pause: Duration) -> Result<(), ExtractError> {
        Ok(())
    }

    async fn scan_dom(&mut self) -> Result<DomScan, ExtractError> {
        Ok(DomScan::from_html(&self.html))
    }

    async fn close(self: Box<Self>) {}
}
