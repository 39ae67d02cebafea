use crate::core::error::ExtractError;
use crate::images::profile::ExtractionProfile;
use crate::scraping::dom_scan::DomScan;
use crate::scraping::renderer::RenderSession;
use crate::AppState;
use tracing::{error, info};
use url::Url;

/// Render `raw_url`, scan it and return the accepted content images.
///
/// The rendering session is closed exactly once before returning, whether
/// the scan succeeded or not.
pub async fn extract_images(state: &AppState, raw_url: Option<&str>) -> Result<Vec<String>, ExtractError> {
    let profile = state.profile.as_ref();
    let url = parse_target(raw_url, &profile.allowed_domains)?;

    let mut session = state.renderer.open(&url, &profile.page_load).await.map_err(|e| {
        error!("Render error for {}: {}", url, e);
        e
    })?;

    let scanned = scan_session(session.as_mut(), profile).await;
    session.close().await;

    let scan = scanned.map_err(|e| {
        error!("Scan error for {}: {}", url, e);
        e
    })?;

    let images = profile.harvest(&scan);
    info!(
        "🖼️ {}: {} meta, {} img, {} styles → {} images",
        url,
        scan.meta_images.len(),
        scan.images.len(),
        scan.inline_styles.len(),
        images.len()
    );
    Ok(images)
}

async fn scan_session(
    session: &mut dyn RenderSession,
    profile: &ExtractionProfile,
) -> Result<DomScan, ExtractError> {
    let load = &profile.page_load;
    if load.auto_scroll {
        session
            .scroll_to_bottom(load.max_scroll_rounds, load.scroll_pause)
            .await?;
    }
    if !load.settle.is_zero() {
        tokio::time::sleep(load.settle).await;
    }
    session.scan_dom().await
}

/// Validate the caller's URL before any browser is launched.
pub fn parse_target(raw_url: Option<&str>, allowed_domains: &[String]) -> Result<Url, ExtractError> {
    let raw = raw_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ExtractError::MissingInput)?;

    let url = Url::parse(raw).map_err(|e| ExtractError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw,
            url.scheme()
        )));
    }

    if !allowed_domains.is_empty() {
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        if !host_allowed(&host, allowed_domains) {
            return Err(ExtractError::InvalidDomain(host));
        }
    }

    Ok(url)
}

fn host_allowed(host: &str, allowed_domains: &[String]) -> bool {
    allowed_domains.iter().any(|d| {
        host == d
            || host
                .strip_suffix(d.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
