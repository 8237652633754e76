// URL validation and canonicalization
//
// Pure string work, no I/O. Short-link domains are rewritten to their
// long form and known tracking parameters are stripped.

use regex::Regex;

use super::errors::{DownloadError, Result};
use super::models::MediaUrl;

/// URLs shorter than this are rejected
pub const MIN_URL_LEN: usize = 10;

lazy_static::lazy_static! {
    static ref TRACKING_RE: Regex = Regex::new(r"^(?:mibextid|app|source|paipv|si)=").unwrap();
}

/// Short-link host fragment and the long-form template (`{id}` is substituted)
const SHORT_LINKS: &[(&str, &str)] = &[
    ("fb.watch/", "https://www.facebook.com/watch/?v={id}"),
    ("youtu.be/", "https://www.youtube.com/watch?v={id}"),
];

/// Check a raw string and wrap it as a [`MediaUrl`].
///
/// The input is trimmed first. Fails with `InvalidInput` when it is empty,
/// lacks an `http://`/`https://` prefix or is shorter than [`MIN_URL_LEN`].
pub fn validate_url(raw: &str) -> Result<MediaUrl> {
    let url = raw.trim();

    if url.is_empty() {
        return Err(DownloadError::InvalidInput("URL cannot be empty".to_string()));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        let preview: String = url.chars().take(50).collect();
        return Err(DownloadError::InvalidInput(format!(
            "URL must start with http:// or https:// (got: {})",
            preview
        )));
    }

    if url.chars().count() < MIN_URL_LEN {
        return Err(DownloadError::InvalidInput(format!(
            "URL too short: {}",
            url
        )));
    }

    Ok(MediaUrl::from_validated(url.to_string()))
}

/// Validate and canonicalize a raw URL.
///
/// Idempotent: normalizing an already-normalized URL returns it unchanged.
pub fn normalize(raw: &str) -> Result<MediaUrl> {
    let url = validate_url(raw)?;
    let cleaned = strip_tracking(url.as_str());
    let expanded = expand_short_link(&cleaned).unwrap_or(cleaned);
    // the rewritten form must still pass validation
    validate_url(&expanded)
}

/// Drop tracking parameters from the query; the path is never touched
fn strip_tracking(url: &str) -> String {
    let Some((head, rest)) = url.split_once('?') else {
        return url.to_string();
    };
    let (query, fragment) = match rest.split_once('#') {
        Some((query, fragment)) => (query, Some(fragment)),
        None => (rest, None),
    };

    let params: Vec<&str> = query.split('&').collect();
    if !query.is_empty() && !params.iter().any(|p| TRACKING_RE.is_match(p)) {
        return url.to_string();
    }

    let kept: Vec<&str> = params
        .into_iter()
        .filter(|p| !p.is_empty() && !TRACKING_RE.is_match(p))
        .collect();

    let mut out = head.to_string();
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn expand_short_link(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    for (fragment, template) in SHORT_LINKS {
        let Some(start) = lower.find(fragment) else {
            continue;
        };
        let rest = &url[start + fragment.len()..];
        let path = rest.split(['?', '#']).next().unwrap_or("");
        let id = path.split('/').rfind(|s| !s.is_empty())?;
        return Some(template.replace("{id}", id));
    }
    None
}
