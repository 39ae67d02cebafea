#![allow(dead_code)]

use async_trait::async_trait;
use image_scout::core::config::ScoutConfig;
use image_scout::images::profile::{ExtractionProfile, PageLoadOptions, ProfilePreset};
use image_scout::scraping::dom_scan::DomScan;
use image_scout::scraping::renderer::{PageRenderer, RenderSession};
use image_scout::{AppState, ExtractError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub scrolled: AtomicUsize,
    pub scanned: AtomicUsize,
    pub closed: AtomicUsize,
}

pub fn count(c: &AtomicUsize) -> usize {
    c.load(Ordering::SeqCst)
}

/// Renderer that serves a canned page instead of launching a browser.
pub struct ScriptedRenderer {
    html: Option<String>,
    fail_open: bool,
    pub counters: Arc<Counters>,
}

impl ScriptedRenderer {
    pub fn page(html: &str) -> Self {
        Self {
            html: Some(html.to_string()),
            fail_open: false,
            counters: Arc::default(),
        }
    }

    /// Opens fine, but the DOM scan errors.
    pub fn broken_scan() -> Self {
        Self {
            html: None,
            fail_open: false,
            counters: Arc::default(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            html: None,
            fail_open: true,
            counters: Arc::default(),
        }
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open(
        &self,
        _url: &Url,
        _options: &PageLoadOptions,
    ) -> Result<Box<dyn RenderSession>, ExtractError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(ExtractError::RenderFailure("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        Ok(Box::new(ScriptedSession {
            html: self.html.clone(),
            counters: self.counters.clone(),
        }))
    }
}

struct ScriptedSession {
    html: Option<String>,
    counters: Arc<Counters>,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn scroll_to_bottom(&mut self, _max_rounds: u32, _pause: Duration) -> Result<(), ExtractError> {
        self.counters.scrolled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scan_dom(&mut self) -> Result<DomScan, ExtractError> {
        self.counters.scanned.fetch_add(1, Ordering::SeqCst);
        match &self.html {
            Some(html) => Ok(DomScan::from_html(html)),
            None => Err(ExtractError::RenderFailure("Execution context was destroyed".into())),
        }
    }

    async fn close(self: Box<Self>) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Preset profile with the settle delay removed so tests stay fast.
pub fn quick_profile(preset: ProfilePreset) -> ExtractionProfile {
    let mut profile = ExtractionProfile::preset(preset);
    profile.page_load.settle = Duration::ZERO;
    profile
}

pub fn state_with(renderer: ScriptedRenderer, profile: ExtractionProfile) -> (AppState, Arc<Counters>) {
    state_with_config(renderer, profile, ScoutConfig::default())
}

pub fn state_with_config(
    renderer: ScriptedRenderer,
    profile: ExtractionProfile,
    config: ScoutConfig,
) -> (AppState, Arc<Counters>) {
    let counters = renderer.counters.clone();
    let state = AppState::from_config(reqwest::Client::new(), config)
        .expect("test config is valid")
        .with_renderer(Arc::new(renderer))
        .with_profile(profile);
    (state, counters)
}

pub const GALLERY_PAGE: &str = r#"<!doctype html>
<html><head>
  <meta property="og:image" content="https://p77cdn.tiktokcdn.com/obj/cover.jpg">
  <meta name="twitter:image" content="https://p16-sign.tiktokcdn.com/avatar.jpg">
</head><body>
  <img src="https://p16-sign.tiktokcdn.com/tos/me~c5_100x100.jpeg" width="40" height="40">
  <img src="https://p77cdn.tiktokcdn.com/obj/slide-1.webp" width="1080" height="1440"
       srcset="https://p77cdn.tiktokcdn.com/obj/slide-1-small.webp 480w, https://p77cdn.tiktokcdn.com/obj/slide-1.webp 1080w">
  <img src="https://p77cdn.tiktokcdn.com/obj/slide-1.webp" width="1080" height="1440">
  <img src="https://p77cdn.tiktokcdn.com/obj/icon.png" width="50" height="50">
  <img src="https://p77cdn.tiktokcdn.com/obj/slide-2.jpg?x-expires=1700000000" width="1080" height="1440">
  <div style="background-image:url('https://cdn.example.com/bg.png')"></div>
</body></html>"#;
