use crate::core::error::ExtractError;
use crate::AppState;
use tracing::{error, info};
use url::Url;

/// An image fetched on the caller's behalf.
#[derive(Debug)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Proxy a GET for an already-extracted image URL.
///
/// CDNs that hotlink-protect their images check `Referer`; it is taken from
/// `referer`, else the configured default, else the image's own origin.
pub async fn download_image(
    state: &AppState,
    raw_url: Option<&str>,
    referer: Option<&str>,
) -> Result<DownloadedImage, ExtractError> {
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

    let referer = referer
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| state.config.resolve_default_referer())
        .unwrap_or_else(|| origin_referer(&url));

    info!("⬇️ Downloading {} (referer: {})", url, referer);

    let response = state
        .http_client
        .get(url.as_str())
        .header(reqwest::header::REFERER, referer)
        .send()
        .await
        .map_err(|e| download_failed(&url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(download_failed(&url, format!("upstream returned HTTP {}", status.as_u16())));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_failed(&url, e))?;

    Ok(DownloadedImage {
        bytes: bytes.to_vec(),
        content_type,
        file_name: file_name_for(&url),
    })
}

fn download_failed(url: &Url, e: impl std::fmt::Display) -> ExtractError {
    error!("Download error for {}: {}", url, e);
    ExtractError::DownloadFailure(e.to_string())
}

fn origin_referer(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}

/// Last non-empty path segment, restricted to filename-safe characters.
pub fn file_name_for(url: &Url) -> String {
    let name: String = url
        .path_segments()
        .and_then(|mut segs| segs.rfind(|s| !s.is_empty()))
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        "image".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_last_segment() {
        let url = Url::parse("https://cdn.example.com/obj/photo-1.webp?x=1").unwrap();
        assert_eq!(file_name_for(&url), "photo-1.webp");
        let url = Url::parse("https://cdn.example.com/dir/").unwrap();
        assert_eq!(file_name_for(&url), "dir");
        let url = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(file_name_for(&url), "image");
    }

    #[test]
    fn origin_referer_keeps_scheme_host_port() {
        let url = Url::parse("http://cdn.example.com:8080/a/b.jpg").unwrap();
        assert_eq!(origin_referer(&url), "http://cdn.example.com:8080/");
    }
}
