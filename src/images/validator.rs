//! Content-image predicate.
//!
//! A candidate URL is kept only when it carries none of the avatar/profile
//! markers and ends with (or, in loose mode, contains) an allowed image
//! extension. Matching is case-insensitive; the caller's string is never
//! rewritten.

use crate::core::error::ExtractError;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder};

/// Markers of profile pictures and avatar CDN buckets.
pub const BASE_BLOCKLIST: &[&str] = &[
    "avatar",
    "profile",
    "userpic",
    "default_avatar",
    "headshot",
    "p16-sign",
    "p19-sign",
    "p23-sign",
];

/// Additional markers used by the extended rule set (sized avatar renditions).
pub const EXTENDED_BLOCKLIST_EXTRAS: &[&str] = &["user-avatar", "_720x720", "_100x100"];

pub const STRICT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];
pub const LOOSE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionMatch {
    /// URL must end with the extension.
    Suffix,
    /// Extension may appear anywhere, e.g. `?name=x.jpg&v=2`.
    Substring,
}

impl ExtensionMatch {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "suffix" | "strict" => Some(ExtensionMatch::Suffix),
            "substring" | "loose" | "contains" => Some(ExtensionMatch::Substring),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionMatch::Suffix => "suffix",
            ExtensionMatch::Substring => "substring",
        }
    }
}

/// Plain-data description of a validator rule set, as read from config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorPolicy {
    pub blocklist: Vec<String>,
    pub extensions: Vec<String>,
    pub extension_match: ExtensionMatch,
}

impl ValidatorPolicy {
    pub fn strict() -> Self {
        Self {
            blocklist: BASE_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            extensions: STRICT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            extension_match: ExtensionMatch::Suffix,
        }
    }

    pub fn loose() -> Self {
        Self {
            blocklist: BASE_BLOCKLIST
                .iter()
                .chain(EXTENDED_BLOCKLIST_EXTRAS)
                .map(|s| s.to_string())
                .collect(),
            extensions: LOOSE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            extension_match: ExtensionMatch::Substring,
        }
    }
}

impl Default for ValidatorPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

/// Compiled form of a [`ValidatorPolicy`].
#[derive(Clone, Debug)]
pub struct ImageValidator {
    blocklist: AhoCorasick,
    extensions: Vec<String>,
    extension_match: ExtensionMatch,
}

impl ImageValidator {
    pub fn new(policy: &ValidatorPolicy) -> Result<Self, ExtractError> {
        // An empty keyword would match every URL.
        let keywords: Vec<String> = policy
            .blocklist
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let blocklist = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&keywords)
            .map_err(|e| ExtractError::Config(format!("invalid blocklist: {}", e)))?;

        let extensions = policy
            .extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| e.len() > 1)
            .collect();

        Ok(Self {
            blocklist,
            extensions,
            extension_match: policy.extension_match,
        })
    }

    /// Accepts `None` so callers holding an optional attribute value can
    /// ask directly.
    pub fn is_valid_image(&self, url: Option<&str>) -> bool {
        match url {
            Some(u) => self.accepts(u),
            None => false,
        }
    }

    pub fn accepts(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        let lower = url.to_lowercase();
        if self.blocklist.is_match(&lower) {
            return false;
        }
        self.has_allowed_extension(&lower)
    }

    fn has_allowed_extension(&self, lower: &str) -> bool {
        match self.extension_match {
            ExtensionMatch::Suffix => self.extensions.iter().any(|e| lower.ends_with(e.as_str())),
            ExtensionMatch::Substring => self.extensions.iter().any(|e| lower.contains(e.as_str())),
        }
    }

    pub fn extension_match(&self) -> ExtensionMatch {
        self.extension_match
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(&ValidatorPolicy::strict()).expect("built-in blocklist compiles")
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> ImageValidator {
        ImageValidator::new(&ValidatorPolicy::strict()).unwrap()
    }

    fn loose() -> ImageValidator {
        ImageValidator::new(&ValidatorPolicy::loose()).unwrap()
    }

    #[test]
    fn rejects_signed_avatar_bucket() {
        assert!(!strict().accepts("https://p16-sign.tiktokcdn.com/foo.jpg"));
        assert!(!loose().accepts("https://p16-sign.tiktokcdn.com/foo.jpg"));
    }

    #[test]
    fn accepts_plain_content_image() {
        assert!(strict().accepts("https://p77cdn.tiktokcdn.com/obj/123.webp"));
    }

    #[test]
    fn query_string_extension_depends_on_mode() {
        let url = "https://cdn.example.com/image.jpg?w=200";
        assert!(!strict().accepts(url));
        assert!(loose().accepts(url));
    }

    #[test]
    fn empty_and_absent_are_rejected() {
        let v = strict();
        assert!(!v.accepts(""));
        assert!(!v.is_valid_image(None));
        assert!(!v.is_valid_image(Some("")));
    }

    #[test]
    fn blocklist_is_case_insensitive() {
        assert!(!strict().accepts("https://cdn.example.com/users/AVATAR/me.png"));
        assert!(!strict().accepts("https://cdn.example.com/HeadShot.JPG"));
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert!(strict().accepts("https://cdn.example.com/Photo.JPEG"));
    }

    #[test]
    fn gif_only_in_loose_set() {
        let url = "https://cdn.example.com/anim.gif";
        assert!(!strict().accepts(url));
        assert!(loose().accepts(url));
    }

    #[test]
    fn sized_avatar_renditions_only_blocked_by_extended_list() {
        let url = "https://cdn.example.com/cover_720x720.jpg";
        assert!(strict().accepts(url));
        assert!(!loose().accepts(url));
    }

    #[test]
    fn custom_policy_normalizes_extensions_and_ignores_blank_keywords() {
        let policy = ValidatorPolicy {
            blocklist: vec!["  ".into(), "Logo".into()],
            extensions: vec!["AVIF".into()],
            extension_match: ExtensionMatch::Suffix,
        };
        let v = ImageValidator::new(&policy).unwrap();
        assert!(v.accepts("https://cdn.example.com/a.avif"));
        assert!(!v.accepts("https://cdn.example.com/logo.avif"));
        assert!(!v.accepts("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn parse_extension_match_aliases() {
        assert_eq!(ExtensionMatch::parse_str("Strict"), Some(ExtensionMatch::Suffix));
        assert_eq!(ExtensionMatch::parse_str("loose"), Some(ExtensionMatch::Substring));
        assert_eq!(ExtensionMatch::parse_str("regex"), None);
    }
}
