// Video information lookup (`--dump-json`) without downloading

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chain::ChainDriver;
use super::errors::{DownloadError, Result};
use super::models::{Arg, MediaUrl, Preset};

/// Formats listed in the summary
const LISTED_FORMATS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSummary {
    pub format_id: String,
    pub format_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub uploader: Option<String>,
    /// Total number of formats the tool reported
    pub format_count: usize,
    /// The first few of them
    pub formats: Vec<FormatSummary>,
}

#[derive(Deserialize)]
struct RawFormat {
    #[serde(default)]
    format_id: Option<String>,
    #[serde(default)]
    format_note: Option<String>,
}

#[derive(Deserialize)]
struct RawInfo {
    title: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    uploader: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

/// Capturing preset that prints the info JSON
pub fn info_preset() -> Preset {
    Preset::new(
        "info",
        vec![Arg::flag("--dump-json"), Arg::flag("--no-warnings")],
    )
    .capturing()
}

/// Parse the tool's JSON dump
pub fn parse_video_info(json: &str) -> Result<VideoInfo> {
    let raw: RawInfo = serde_json::from_str(json.trim()).map_err(|e| {
        DownloadError::InvalidInput(format!("could not parse video information: {}", e))
    })?;

    let format_count = raw.formats.len();
    let formats = raw
        .formats
        .into_iter()
        .take(LISTED_FORMATS)
        .map(|f| FormatSummary {
            format_id: f.format_id.unwrap_or_else(|| "?".to_string()),
            format_note: f.format_note,
        })
        .collect();

    Ok(VideoInfo {
        title: raw.title,
        duration: raw.duration,
        view_count: raw.view_count,
        uploader: raw.uploader,
        format_count,
        formats,
    })
}

/// Ask the external tool for information about `url`
pub async fn fetch_video_info(driver: &ChainDriver, url: &MediaUrl) -> Result<VideoInfo> {
    let invocation = driver.invocation(&info_preset(), url);
    debug!(command = %invocation.display(), "Fetching video info");

    let output = driver
        .executor()
        .execute(&invocation)
        .await
        .map_err(|failure| DownloadError::AttemptFailed {
            label: "info".to_string(),
            failure,
        })?;

    parse_video_info(output.stdout.as_deref().unwrap_or_default())
}
