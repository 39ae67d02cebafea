use crate::core::error::ExtractError;
use crate::images::profile::ProfilePreset;
use crate::images::validator::ExtensionMatch;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (image-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "IMAGE_SCOUT_CONFIG";
pub const ENV_PROFILE: &str = "IMAGE_SCOUT_PROFILE";
pub const ENV_BLOCKLIST: &str = "IMAGE_SCOUT_BLOCKLIST";
pub const ENV_EXTENSIONS: &str = "IMAGE_SCOUT_EXTENSIONS";
pub const ENV_EXTENSION_MATCH: &str = "IMAGE_SCOUT_EXTENSION_MATCH";
pub const ENV_MIN_IMAGE_SIZE: &str = "IMAGE_SCOUT_MIN_IMAGE_SIZE";
pub const ENV_SETTLE_MS: &str = "IMAGE_SCOUT_SETTLE_MS";
pub const ENV_NAV_TIMEOUT_MS: &str = "IMAGE_SCOUT_NAV_TIMEOUT_MS";
pub const ENV_ALLOWED_DOMAINS: &str = "IMAGE_SCOUT_ALLOWED_DOMAINS";
pub const ENV_REFERER: &str = "IMAGE_SCOUT_REFERER";
pub const ENV_RENDERER: &str = "IMAGE_SCOUT_RENDERER";
pub const ENV_STATIC_DIR: &str = "IMAGE_SCOUT_STATIC_DIR";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

/// Which rendering engine backs `/extract`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererKind {
    /// Headless Chromium over CDP; runs page scripts and reports geometry.
    Chromium,
    /// Plain HTTP fetch + HTML parse; no JavaScript, no layout.
    Static,
}

impl RendererKind {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" | "browser" | "cdp" => Some(RendererKind::Chromium),
            "static" | "http" | "html" => Some(RendererKind::Static),
            _ => None,
        }
    }
}

/// Top-level config loaded from `image-scout.json`.
///
/// Every field is optional. Absent fields fall back to an environment variable
/// where one exists, then to the selected profile preset.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ScoutConfig {
    /// `classic` (default) or `extended`.
    pub profile: Option<String>,
    pub blocklist: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    /// `suffix` or `substring`.
    pub extension_match: Option<String>,
    /// Minimum rendered width and height for `img` candidates. `0` disables the filter.
    pub min_image_size: Option<f64>,
    pub collect_srcset: Option<bool>,
    pub collect_backgrounds: Option<bool>,
    pub auto_scroll: Option<bool>,
    pub settle_ms: Option<u64>,
    pub navigation_timeout_ms: Option<u64>,
    /// Hosts `/extract` will accept (subdomains included). Empty accepts any host.
    pub allowed_domains: Option<Vec<String>>,
    /// Referer sent by `/download` when the caller supplies none.
    pub default_referer: Option<String>,
    pub renderer: Option<String>,
    pub static_dir: Option<String>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    env_nonempty(key).map(|v| split_list(&v))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ScoutConfig {
    /// Preset: JSON `profile` → `IMAGE_SCOUT_PROFILE` → `classic`.
    pub fn resolve_preset(&self) -> Result<ProfilePreset, ExtractError> {
        let Some(raw) = self.profile.clone().or_else(|| env_nonempty(ENV_PROFILE)) else {
            return Ok(ProfilePreset::Classic);
        };
        ProfilePreset::parse_str(&raw)
            .ok_or_else(|| ExtractError::Config(format!("unknown profile '{}'", raw)))
    }

    /// Blocklist: JSON → `IMAGE_SCOUT_BLOCKLIST` (comma separated) → preset.
    pub fn resolve_blocklist(&self) -> Option<Vec<String>> {
        self.blocklist.clone().or_else(|| env_list(ENV_BLOCKLIST))
    }

    /// Extensions: JSON → `IMAGE_SCOUT_EXTENSIONS` (comma separated) → preset.
    pub fn resolve_extensions(&self) -> Option<Vec<String>> {
        self.extensions.clone().or_else(|| env_list(ENV_EXTENSIONS))
    }

    /// Extension matching: JSON → `IMAGE_SCOUT_EXTENSION_MATCH` → preset.
    pub fn resolve_extension_match(&self) -> Result<Option<ExtensionMatch>, ExtractError> {
        let Some(raw) = self
            .extension_match
            .clone()
            .or_else(|| env_nonempty(ENV_EXTENSION_MATCH))
        else {
            return Ok(None);
        };
        ExtensionMatch::parse_str(&raw)
            .map(Some)
            .ok_or_else(|| ExtractError::Config(format!("unknown extension_match '{}'", raw)))
    }

    /// Minimum image size: JSON → `IMAGE_SCOUT_MIN_IMAGE_SIZE` → preset.
    pub fn resolve_min_image_size(&self) -> Option<f64> {
        self.min_image_size
            .or_else(|| env_nonempty(ENV_MIN_IMAGE_SIZE).and_then(|v| v.parse().ok()))
    }

    /// Settle delay: JSON → `IMAGE_SCOUT_SETTLE_MS` → preset.
    pub fn resolve_settle_ms(&self) -> Option<u64> {
        self.settle_ms
            .or_else(|| env_nonempty(ENV_SETTLE_MS).and_then(|v| v.parse().ok()))
    }

    /// Navigation timeout: JSON → `IMAGE_SCOUT_NAV_TIMEOUT_MS` → 60 000 ms.
    pub fn resolve_navigation_timeout_ms(&self) -> Option<u64> {
        self.navigation_timeout_ms
            .or_else(|| env_nonempty(ENV_NAV_TIMEOUT_MS).and_then(|v| v.parse().ok()))
    }

    /// Allowed domains, lower-cased, leading dots stripped.
    pub fn resolve_allowed_domains(&self) -> Vec<String> {
        self.allowed_domains
            .clone()
            .or_else(|| env_list(ENV_ALLOWED_DOMAINS))
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }

    /// Default referer: JSON → `IMAGE_SCOUT_REFERER` → `None` (image origin is used).
    pub fn resolve_default_referer(&self) -> Option<String> {
        self.default_referer
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_nonempty(ENV_REFERER))
    }

    /// Renderer: JSON → `IMAGE_SCOUT_RENDERER` → chromium.
    pub fn resolve_renderer(&self) -> Result<RendererKind, ExtractError> {
        let Some(raw) = self.renderer.clone().or_else(|| env_nonempty(ENV_RENDERER)) else {
            return Ok(RendererKind::Chromium);
        };
        RendererKind::parse_str(&raw)
            .ok_or_else(|| ExtractError::Config(format!("unknown renderer '{}'", raw)))
    }

    /// Static asset directory: JSON → `IMAGE_SCOUT_STATIC_DIR` → `public`.
    pub fn resolve_static_dir(&self) -> PathBuf {
        self.static_dir
            .clone()
            .or_else(|| env_nonempty(ENV_STATIC_DIR))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("public"))
    }
}

/// Load `image-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `IMAGE_SCOUT_CONFIG` env var path
/// 2. `./image-scout.json`
/// 3. `../image-scout.json`
///
/// Missing file → `ScoutConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_scout_config() -> ScoutConfig {
    let mut candidates = vec![
        PathBuf::from("image-scout.json"),
        PathBuf::from("../image-scout.json"),
    ];
    if let Some(env_path) = env_nonempty(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => return parse_scout_config(&contents, path),
            Err(_) => continue,
        }
    }

    ScoutConfig::default()
}

fn parse_scout_config(contents: &str, path: &Path) -> ScoutConfig {
    match serde_json::from_str::<ScoutConfig>(contents) {
        Ok(cfg) => {
            tracing::info!("image-scout.json loaded from {}", path.display());
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "image-scout.json parse error at {}: {}; using defaults",
                path.display(),
                e
            );
            ScoutConfig::default()
        }
    }
}

/// Optional override for the Chromium-family browser executable.
///
/// Only returns a value when `CHROME_EXECUTABLE` is set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = env_nonempty(ENV_CHROME_EXECUTABLE)?;
    Path::new(&p).exists().then_some(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let cfg = parse_scout_config("{ not json", Path::new("image-scout.json"));
        assert!(cfg.profile.is_none());
        assert!(cfg.blocklist.is_none());
    }

    #[test]
    fn allowed_domains_are_normalized() {
        let cfg = ScoutConfig {
            allowed_domains: Some(vec![" .TikTok.com ".into(), "".into()]),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_allowed_domains(), vec!["tiktok.com"]);
    }

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn renderer_names() {
        assert_eq!(RendererKind::parse_str("CDP"), Some(RendererKind::Chromium));
        assert_eq!(RendererKind::parse_str("static"), Some(RendererKind::Static));
        let cfg = ScoutConfig {
            renderer: Some("webkit".into()),
            ..Default::default()
        };
        assert!(cfg.resolve_renderer().is_err());
    }
}
