use crate::core::config::{load_scout_config, RendererKind, ScoutConfig};
use crate::core::error::ExtractError;
use crate::images::profile::ExtractionProfile;
use crate::scraping::renderer::{ChromiumRenderer, PageRenderer};
use crate::scraping::static_page::StaticRenderer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    pub renderer: Arc<dyn PageRenderer>,
    pub profile: Arc<ExtractionProfile>,
    /// File-based config loaded from `image-scout.json` (env-var fallback for all fields).
    pub config: Arc<ScoutConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("renderer", &self.renderer.name())
            .field("profile", &self.profile.preset.as_str())
            .finish()
    }
}

impl AppState {
    /// Build state from `image-scout.json` and the environment.
    pub fn new(http_client: reqwest::Client) -> Result<Self, ExtractError> {
        Self::from_config(http_client, load_scout_config())
    }

    pub fn from_config(http_client: reqwest::Client, config: ScoutConfig) -> Result<Self, ExtractError> {
        let profile = ExtractionProfile::from_config(&config)?;
        let renderer: Arc<dyn PageRenderer> = match config.resolve_renderer()? {
            RendererKind::Chromium => Arc::new(ChromiumRenderer::new()),
            RendererKind::Static => Arc::new(StaticRenderer::new(http_client.clone())),
        };
        Ok(Self {
            http_client,
            renderer,
            profile: Arc::new(profile),
            config: Arc::new(config),
        })
    }

    /// Swap the rendering engine, e.g. for a scripted one in tests.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_profile(mut self, profile: ExtractionProfile) -> Self {
        self.profile = Arc::new(profile);
        self
    }
}
