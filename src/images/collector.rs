use crate::scraping::dom_scan::{DomScan, ImageElement};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Which DOM sources feed the candidate list, beyond metadata tags and `img[src]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectorOptions {
    /// Skip `img` elements whose rendered box is smaller than this on either axis.
    pub min_image_size: Option<f64>,
    pub collect_srcset: bool,
    pub collect_backgrounds: bool,
}

impl CollectorOptions {
    pub fn classic() -> Self {
        Self {
            min_image_size: Some(100.0),
            collect_srcset: false,
            collect_backgrounds: false,
        }
    }

    pub fn extended() -> Self {
        Self {
            min_image_size: None,
            collect_srcset: true,
            collect_backgrounds: true,
        }
    }
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self::classic()
    }
}

/// Insertion-ordered set of candidate URLs, deduplicated by exact string.
#[derive(Debug, Default)]
pub struct CandidateSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the value was empty or already present.
    pub fn insert(&mut self, url: &str) -> bool {
        if url.is_empty() || self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.order.push(url.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Enumerate raw candidate URLs from a scan, in scan priority order:
/// metadata tags, then per `img` its `src` followed by its `srcset`
/// entries, then inline background images.
pub fn collect_candidates(scan: &DomScan, options: &CollectorOptions) -> Vec<String> {
    let mut set = CandidateSet::new();

    for content in &scan.meta_images {
        set.insert(content);
    }

    for (idx, img) in scan.images.iter().enumerate() {
        if !passes_size_filter(img, options.min_image_size) {
            debug!("collector: skipping img #{} (too small or no geometry)", idx);
            continue;
        }
        if let Some(src) = img.src.as_deref() {
            set.insert(src);
        }
        if options.collect_srcset {
            if let Some(srcset) = img.srcset.as_deref() {
                for url in parse_srcset(srcset) {
                    set.insert(&url);
                }
            }
        }
    }

    if options.collect_backgrounds {
        for style in &scan.inline_styles {
            for url in background_image_urls(style) {
                set.insert(&url);
            }
        }
    }

    set.into_vec()
}

fn passes_size_filter(img: &ImageElement, min: Option<f64>) -> bool {
    let Some(min) = min else {
        return true;
    };
    match img.bounds {
        Some(b) => b.width >= min && b.height >= min,
        None => false,
    }
}

/// Split a responsive `srcset` into its URLs, dropping width/density descriptors.
pub fn parse_srcset(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn background_declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Quoted runs may hold `;` (data URIs), so they are consumed whole.
        Regex::new(r#"(?i)background-image\s*:((?:"[^"]*"|'[^']*'|[^;"'])*)"#)
            .expect("valid background-image declaration pattern")
    })
}

fn css_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"')\s]+))\s*\)"#)
            .expect("valid css url() pattern")
    })
}

/// URLs inside every `url(...)` of every `background-image` declaration in a
/// style attribute, layers in declaration order.
pub fn background_image_urls(style: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for decl in background_declaration_regex().captures_iter(style) {
        let Some(value) = decl.get(1) else {
            continue;
        };
        for c in css_url_regex().captures_iter(value.as_str()) {
            if let Some(m) = c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)) {
                if !m.as_str().is_empty() {
                    urls.push(m.as_str().to_string());
                }
            }
        }
    }
    urls
}
