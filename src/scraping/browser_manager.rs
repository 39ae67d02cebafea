//! Native browser plumbing on top of `chromiumoxide`.
//!
//! * Finding a usable browser executable (Brave → Chrome → Chromium, cross-platform).
//! * Building the headless launch config (desktop UA, fixed viewport, `en-US`).
//! * Network-idle detection and scroll-to-bottom for lazy-loaded galleries.

use crate::core::config::chrome_executable_override;
use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use rand::seq::IndexedRandom;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Headroom between the navigation timeout and the CDP command timeout.
const CDP_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

const DESKTOP_USER_AGENTS: &[&str] = &[
    // Chrome 120 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 132 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 131 – Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Returns a randomly-chosen Chromium desktop User-Agent string.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan – finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = chrome_executable_override() {
        return Some(p);
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
            "brave",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/local/bin/chromium",
            "/usr/bin/brave-browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

// ── Headless browser config builder ──────────────────────────────────────────

/// Build a `BrowserConfig` for headless rendering.
///
/// `--no-sandbox` and `--disable-dev-shm-usage` keep Chromium alive in
/// containers; `AutomationControlled` is disabled so `navigator.webdriver`
/// stays unset on sites that gate their gallery markup on it.
///
/// Every CDP command, `Page.navigate` included, is bounded by
/// [`cdp_request_timeout`] of `navigation_timeout`.
pub fn build_headless_config(
    exe: &str,
    width: u32,
    height: u32,
    navigation_timeout: Duration,
) -> Result<BrowserConfig> {
    let ua = random_user_agent();

    BrowserConfig::builder()
        .chrome_executable(exe)
        .request_timeout(cdp_request_timeout(navigation_timeout))
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--hide-scrollbars")
        .arg("--mute-audio")
        .arg("--lang=en-US")
        .arg("--force-color-profile=srgb")
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", ua))
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

/// CDP command timeout for a given navigation timeout. It always outlasts the
/// navigation timeout, so a slow `goto` is reported as a navigation timeout
/// instead of a generic CDP request timeout.
pub fn cdp_request_timeout(navigation_timeout: Duration) -> Duration {
    navigation_timeout.saturating_add(CDP_TIMEOUT_MARGIN)
}

// ── Smart wait / networkidle ─────────────────────────────────────────────────

async fn eval_u64(page: &Page, expr: &str) -> Option<u64> {
    page.evaluate(expr)
        .await
        .ok()
        .and_then(|v| v.into_value::<serde_json::Value>().ok())
        .and_then(|j| j.as_f64())
        .map(|f| f.max(0.0) as u64)
}

/// Wait until the page network goes idle (no new resource entries for `quiet`)
/// or until `timeout` has elapsed. Reaching the timeout is not an error.
///
/// Polls `performance.getEntriesByType("resource").length` every 250 ms
/// together with `document.readyState`.
pub async fn wait_until_stable(page: &Page, quiet: Duration, timeout: Duration) -> Result<()> {
    let poll = Duration::from_millis(250);
    let start = Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = Instant::now();

    loop {
        if start.elapsed() >= timeout {
            info!("wait_until_stable: timeout after {}ms", timeout.as_millis());
            break;
        }

        let count = eval_u64(page, "performance.getEntriesByType('resource').length")
            .await
            .unwrap_or(0);

        let ready_complete: bool = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !ready_complete || count != last_count {
            last_count = count;
            stable_since = Instant::now();
        } else if stable_since.elapsed() >= quiet {
            debug!(
                "wait_until_stable: idle after {}ms ({} resources)",
                start.elapsed().as_millis(),
                count
            );
            break;
        }

        tokio::time::sleep(poll).await;
    }
    Ok(())
}

/// Scroll to the bottom repeatedly until the document stops growing, so
/// infinite-scroll and intersection-observer galleries load their images.
///
/// Stops after `max_rounds` to avoid endless feeds.
pub async fn scroll_to_bottom(page: &Page, max_rounds: u32, pause: Duration) -> Result<()> {
    const HEIGHT_EXPR: &str =
        "Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight)";

    let mut last_height = eval_u64(page, HEIGHT_EXPR).await.unwrap_or(0);
    for round in 0..max_rounds {
        if let Err(e) = page
            .evaluate(format!("window.scrollTo(0, {});", HEIGHT_EXPR))
            .await
        {
            warn!("scroll_to_bottom: round {} error: {}", round, e);
            break;
        }
        tokio::time::sleep(pause).await;

        let height = eval_u64(page, HEIGHT_EXPR).await.unwrap_or(last_height);
        if height <= last_height {
            debug!("scroll_to_bottom: height settled at {} after {} rounds", height, round + 1);
            return Ok(());
        }
        last_height = height;
    }
    debug!("scroll_to_bottom: stopped at round cap ({})", max_rounds);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_is_a_desktop_chromium_string() {
        let ua = random_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(ua.contains("Chrome/"));
    }

    #[test]
    fn cdp_timeout_outlasts_navigation_timeout() {
        // chromiumoxide's own default is 30 s; the 60 s navigation default must still win.
        let nav = Duration::from_millis(60_000);
        assert!(cdp_request_timeout(nav) > nav);
        assert!(cdp_request_timeout(nav) > Duration::from_secs(30));
        assert!(cdp_request_timeout(Duration::ZERO) > Duration::ZERO);
        assert_eq!(cdp_request_timeout(Duration::MAX), Duration::MAX);
    }
}
