use super::collector::{collect_candidates, CollectorOptions};
use super::validator::{ImageValidator, ValidatorPolicy};
use crate::core::config::ScoutConfig;
use crate::core::error::ExtractError;
use crate::scraping::dom_scan::DomScan;
use std::time::Duration;

/// Named starting points for an [`ExtractionProfile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfilePreset {
    /// Strict suffix matching, 100px geometry filter, meta + `img[src]` only.
    Classic,
    /// Loose matching with `.gif`, srcset and inline backgrounds, scroll + settle.
    Extended,
}

impl ProfilePreset {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classic" | "simple" | "strict" => Some(ProfilePreset::Classic),
            "extended" | "loose" => Some(ProfilePreset::Extended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfilePreset::Classic => "classic",
            ProfilePreset::Extended => "extended",
        }
    }
}

/// How the page is brought to a scannable state.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLoadOptions {
    pub navigation_timeout: Duration,
    pub idle_quiet: Duration,
    pub idle_timeout: Duration,
    pub auto_scroll: bool,
    pub max_scroll_rounds: u32,
    pub scroll_pause: Duration,
    /// Fixed wait after scrolling, for lazy images to swap in their real `src`.
    pub settle: Duration,
}

impl PageLoadOptions {
    pub fn classic() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(60_000),
            idle_quiet: Duration::from_millis(500),
            idle_timeout: Duration::from_millis(15_000),
            auto_scroll: false,
            max_scroll_rounds: 20,
            scroll_pause: Duration::from_millis(400),
            settle: Duration::ZERO,
        }
    }

    pub fn extended() -> Self {
        Self {
            auto_scroll: true,
            settle: Duration::from_millis(2_000),
            ..Self::classic()
        }
    }
}

impl Default for PageLoadOptions {
    fn default() -> Self {
        Self::classic()
    }
}

/// One validator rule set, collector source set and page-load recipe.
#[derive(Clone, Debug)]
pub struct ExtractionProfile {
    pub preset: ProfilePreset,
    pub policy: ValidatorPolicy,
    pub validator: ImageValidator,
    pub collector: CollectorOptions,
    pub page_load: PageLoadOptions,
    /// Empty means any host is accepted.
    pub allowed_domains: Vec<String>,
}

impl ExtractionProfile {
    pub fn preset(preset: ProfilePreset) -> Self {
        let (policy, collector, page_load) = match preset {
            ProfilePreset::Classic => (
                ValidatorPolicy::strict(),
                CollectorOptions::classic(),
                PageLoadOptions::classic(),
            ),
            ProfilePreset::Extended => (
                ValidatorPolicy::loose(),
                CollectorOptions::extended(),
                PageLoadOptions::extended(),
            ),
        };
        let validator = ImageValidator::new(&policy).expect("built-in blocklist compiles");
        Self {
            preset,
            policy,
            validator,
            collector,
            page_load,
            allowed_domains: Vec::new(),
        }
    }

    /// Start from the configured preset and apply every field override.
    pub fn from_config(cfg: &ScoutConfig) -> Result<Self, ExtractError> {
        let preset = cfg.resolve_preset()?;
        let base = Self::preset(preset);

        let mut policy = base.policy;
        if let Some(blocklist) = cfg.resolve_blocklist() {
            policy.blocklist = blocklist;
        }
        if let Some(extensions) = cfg.resolve_extensions() {
            policy.extensions = extensions;
        }
        if let Some(mode) = cfg.resolve_extension_match()? {
            policy.extension_match = mode;
        }

        let mut collector = base.collector;
        if let Some(min) = cfg.resolve_min_image_size() {
            collector.min_image_size = (min > 0.0).then_some(min);
        }
        if let Some(v) = cfg.collect_srcset {
            collector.collect_srcset = v;
        }
        if let Some(v) = cfg.collect_backgrounds {
            collector.collect_backgrounds = v;
        }

        let mut page_load = base.page_load;
        if let Some(v) = cfg.auto_scroll {
            page_load.auto_scroll = v;
        }
        if let Some(ms) = cfg.resolve_settle_ms() {
            page_load.settle = Duration::from_millis(ms);
        }
        if let Some(ms) = cfg.resolve_navigation_timeout_ms() {
            page_load.navigation_timeout = Duration::from_millis(ms);
        }

        let validator = ImageValidator::new(&policy)?;
        Ok(Self {
            preset,
            policy,
            validator,
            collector,
            page_load,
            allowed_domains: cfg.resolve_allowed_domains(),
        })
    }

    /// Collect candidates from a scan and keep only accepted content images.
    pub fn harvest(&self, scan: &DomScan) -> Vec<String> {
        collect_candidates(scan, &self.collector)
            .into_iter()
            .filter(|url| self.validator.accepts(url))
            .collect()
    }
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        Self::preset(ProfilePreset::Classic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::validator::ExtensionMatch;
    use crate::scraping::dom_scan::{BoundingBox, ImageElement};

    #[test]
    fn classic_harvest_filters_and_dedupes() {
        let scan = DomScan {
            meta_images: vec![
                "https://cdn.example.com/cover.jpg".into(),
                "https://cdn.example.com/avatar/me.jpg".into(),
            ],
            images: vec![
                ImageElement {
                    src: Some("https://cdn.example.com/cover.jpg".into()),
                    srcset: None,
                    bounds: Some(BoundingBox { width: 640.0, height: 480.0 }),
                },
                ImageElement {
                    src: Some("https://cdn.example.com/icon.png".into()),
                    srcset: None,
                    bounds: Some(BoundingBox { width: 50.0, height: 50.0 }),
                },
            ],
            ..Default::default()
        };
        let profile = ExtractionProfile::default();
        assert_eq!(profile.harvest(&scan), vec!["https://cdn.example.com/cover.jpg"]);
    }

    #[test]
    fn extended_harvest_reads_backgrounds() {
        let scan = DomScan::from_html(
            r#"<div style="background-image:url('https://cdn.example.com/bg.png')"></div>"#,
        );
        let profile = ExtractionProfile::preset(ProfilePreset::Extended);
        assert_eq!(profile.harvest(&scan), vec!["https://cdn.example.com/bg.png"]);
    }

    #[test]
    fn config_overrides_preset_fields() {
        let cfg: ScoutConfig = serde_json::from_value(serde_json::json!({
            "profile": "extended",
            "extension_match": "suffix",
            "min_image_size": 0,
            "collect_backgrounds": false,
            "settle_ms": 250,
            "allowed_domains": ["Example.com"]
        }))
        .unwrap();
        let profile = ExtractionProfile::from_config(&cfg).unwrap();
        assert_eq!(profile.preset, ProfilePreset::Extended);
        assert_eq!(profile.validator.extension_match(), ExtensionMatch::Suffix);
        assert!(profile.collector.collect_srcset);
        assert!(!profile.collector.collect_backgrounds);
        assert_eq!(profile.collector.min_image_size, None);
        assert_eq!(profile.page_load.settle, Duration::from_millis(250));
        assert_eq!(profile.allowed_domains, vec!["example.com"]);
    }

    #[test]
    fn unknown_preset_is_a_config_error() {
        let cfg: ScoutConfig =
            serde_json::from_value(serde_json::json!({ "profile": "turbo" })).unwrap();
        assert!(matches!(
            ExtractionProfile::from_config(&cfg),
            Err(ExtractError::Config(_))
        ));
    }
}
