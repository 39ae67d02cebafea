//! Raw DOM scan: everything on a page that could name an image, read but not judged.
//!
//! A scan is produced either inside a live browser tab (see [`dom_scan_script`])
//! or from a static HTML document ([`DomScan::from_html`]). Both produce the
//! same JSON shape so the collector never cares where it came from.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Metadata tags whose `content` attribute names the page's preview image.
pub const META_IMAGE_SELECTORS: &[&str] = &[
    "meta[property='og:image']",
    "meta[name='twitter:image']",
    "meta[itemprop='image']",
];

/// Containers that commonly carry hero/cover images as inline CSS.
pub const BACKGROUND_CONTAINER_SELECTOR: &str = "div[style], section[style], article[style]";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomScan {
    #[serde(default)]
    pub meta_images: Vec<String>,
    #[serde(default)]
    pub images: Vec<ImageElement>,
    /// Raw `style` attribute values that mention `background-image`.
    #[serde(default)]
    pub inline_styles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub srcset: Option<String>,
    /// Rendered size in CSS pixels; `None` when geometry could not be read.
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

impl DomScan {
    /// Scan a static document. There is no layout here, so `bounds` is taken
    /// from numeric `width`/`height` attributes when both are present.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut scan = DomScan::default();

        for sel in META_IMAGE_SELECTORS {
            let Ok(selector) = Selector::parse(sel) else {
                continue;
            };
            for el in document.select(&selector) {
                if let Some(content) = el.value().attr("content") {
                    if !content.is_empty() {
                        scan.meta_images.push(content.to_string());
                    }
                }
            }
        }

        if let Ok(selector) = Selector::parse("img") {
            for el in document.select(&selector) {
                let attrs = el.value();
                scan.images.push(ImageElement {
                    src: attrs.attr("src").map(str::to_string),
                    srcset: attrs.attr("srcset").map(str::to_string),
                    bounds: declared_bounds(attrs.attr("width"), attrs.attr("height")),
                });
            }
        }

        if let Ok(selector) = Selector::parse(BACKGROUND_CONTAINER_SELECTOR) {
            for el in document.select(&selector) {
                if let Some(style) = el.value().attr("style") {
                    if style.to_ascii_lowercase().contains("background-image") {
                        scan.inline_styles.push(style.to_string());
                    }
                }
            }
        }

        scan
    }
}

fn declared_bounds(width: Option<&str>, height: Option<&str>) -> Option<BoundingBox> {
    let parse = |v: &str| v.trim().trim_end_matches("px").parse::<f64>().ok();
    Some(BoundingBox {
        width: parse(width?)?,
        height: parse(height?)?,
    })
}

/// The extraction function evaluated inside the page.
///
/// Every element read is wrapped in its own `try` so one detached or
/// exotic node cannot abort the whole scan; geometry failures leave
/// `bounds` as `null`.
pub fn dom_scan_script() -> String {
    let meta = serde_json::to_string(META_IMAGE_SELECTORS).unwrap_or_else(|_| "[]".to_string());
    let containers = serde_json::to_string(BACKGROUND_CONTAINER_SELECTOR)
        .unwrap_or_else(|_| "\"div[style]\"".to_string());
    format!(
        r#"(() => {{
    const scan = {{ meta_images: [], images: [], inline_styles: [] }};
    for (const sel of {meta}) {{
        for (const el of document.querySelectorAll(sel)) {{
            try {{
                const content = el.getAttribute("content");
                if (content) scan.meta_images.push(content);
            }} catch (_) {{}}
        }}
    }}
    for (const img of document.querySelectorAll("img")) {{
        try {{
            const entry = {{ src: img.getAttribute("src"), srcset: img.getAttribute("srcset"), bounds: null }};
            try {{
                const r = img.getBoundingClientRect();
                entry.bounds = {{ width: r.width, height: r.height }};
            }} catch (_) {{}}
            scan.images.push(entry);
        }} catch (_) {{}}
    }}
    for (const el of document.querySelectorAll({containers})) {{
        try {{
            const style = el.getAttribute("style");
            if (style && style.toLowerCase().includes("background-image")) scan.inline_styles.push(style);
        }} catch (_) {{}}
    }}
    return scan;
}})()"#
    )
}
