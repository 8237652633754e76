// Platform classification by domain fragment

use std::fmt;

use serde::{Deserialize, Serialize};

/// Originating platform of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformTag {
    Facebook,
    Instagram,
    Tiktok,
    Youtube,
    Twitter,
    Generic,
}

/// Domain fragments per platform; first match wins
const DOMAINS: &[(PlatformTag, &[&str])] = &[
    (PlatformTag::Facebook, &["facebook.com", "fb.watch", "fb.com"]),
    (PlatformTag::Instagram, &["instagram.com"]),
    (PlatformTag::Tiktok, &["tiktok.com"]),
    (PlatformTag::Youtube, &["youtube.com", "youtu.be"]),
    (PlatformTag::Twitter, &["twitter.com", "x.com"]),
];

impl PlatformTag {
    pub const ALL: [PlatformTag; 6] = [
        Self::Facebook,
        Self::Instagram,
        Self::Tiktok,
        Self::Youtube,
        Self::Twitter,
        Self::Generic,
    ];

    /// Classify a URL. Total: anything unmatched is `Generic`.
    pub fn classify(url: &str) -> Self {
        let lower = url.to_lowercase();
        DOMAINS
            .iter()
            .find(|(_, fragments)| fragments.iter().any(|d| lower.contains(d)))
            .map(|(tag, _)| *tag)
            .unwrap_or(Self::Generic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
            Self::Twitter => "twitter",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
