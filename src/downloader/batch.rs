// Batch orchestrator - sequential downloads from a URL list
//
// URLs are processed strictly in input order, one at a time. A failed URL
// is recorded and the batch moves on; cancellation stops before the next
// URL and keeps everything recorded so far.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::credentials::expand_home;
use super::errors::{DownloadError, Result};
use super::models::MediaUrl;
use super::orchestrator::Downloader;
use super::url::validate_url;

pub const DEFAULT_FAILED_REPORT: &str = "failed_urls.txt";

/// A line of the input that was not used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// Result of parsing a URL list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlList {
    pub urls: Vec<MediaUrl>,
    /// Invalid lines, skipped with a warning
    pub skipped: Vec<SkippedLine>,
}

/// Parse newline-delimited URLs.
///
/// Blank lines and lines starting with `#` are ignored. Every other line is
/// validated on its own; invalid ones are skipped. Fails with `NoValidInput`
/// when nothing usable remains.
pub fn parse_url_list(content: &str) -> Result<UrlList> {
    let mut urls = Vec::new();
    let mut skipped = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match validate_url(line) {
            Ok(url) => urls.push(url),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Line skipped");
                skipped.push(SkippedLine {
                    line: idx + 1,
                    content: line.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if urls.is_empty() {
        return Err(DownloadError::NoValidInput(
            "URLs must start with http:// or https:// and not be commented out".to_string(),
        ));
    }

    info!(count = urls.len(), skipped = skipped.len(), "URL list parsed");
    Ok(UrlList { urls, skipped })
}

/// Read and parse a UTF-8 URL file
pub fn read_url_file(path: &Path) -> Result<UrlList> {
    let resolved = expand_home(path);
    if !resolved.is_file() {
        return Err(DownloadError::InvalidInput(format!(
            "URL file not found: {} (looked for {})",
            path.display(),
            resolved.display()
        )));
    }

    let content = fs::read_to_string(&resolved).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => DownloadError::InvalidInput(format!(
            "{} is not UTF-8 text; save it with UTF-8 encoding",
            resolved.display()
        )),
        _ => DownloadError::Io(e),
    })?;

    parse_url_list(&content)
}

/// Aggregate outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: Vec<MediaUrl>,
    /// (1-based input position, url)
    pub failed: Vec<(usize, MediaUrl)>,
    /// Stopped early by the user
    pub interrupted: bool,
}

impl BatchReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// `succeeded/total`
    pub fn summary_line(&self) -> String {
        format!("{}/{}", self.succeeded.len(), self.total)
    }

    pub fn failed_urls(&self) -> impl Iterator<Item = &MediaUrl> {
        self.failed.iter().map(|(_, url)| url)
    }

    /// Failed-URL list: count header, then one URL per line
    pub fn render_failed_report(&self) -> String {
        let mut out = String::from("# URLs that failed to download\n");
        out.push_str(&format!("# Total: {}\n\n", self.failed.len()));
        for url in self.failed_urls() {
            out.push_str(url.as_str());
            out.push('\n');
        }
        out
    }

    /// Write the failed-URL list into `dir`, returning the file path
    pub fn write_failed_report(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        fs::write(&path, self.render_failed_report())?;
        info!(path = %path.display(), count = self.failed.len(), "Failed URLs saved");
        Ok(path)
    }
}

/// Runs a URL list through a [`Downloader`], one URL at a time
pub struct BatchRunner<'a> {
    downloader: &'a Downloader,
}

impl<'a> BatchRunner<'a> {
    pub fn new(downloader: &'a Downloader) -> Self {
        Self { downloader }
    }

    pub async fn run(&self, urls: &[MediaUrl], cancel: &CancellationToken) -> BatchReport {
        let total = urls.len();
        let mut report = BatchReport::new(total);

        for (idx, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }
            info!(url = %url, "Video {}/{}", idx + 1, total);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(url = %url, "Batch interrupted, current download abandoned");
                    report.interrupted = true;
                    break;
                }
                result = self.downloader.download(url.as_str()) => result,
            };

            match result {
                Ok(success) => {
                    info!(url = %url, preset = %success.winner.label, "Item done");
                    report.succeeded.push(url.clone());
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Item failed");
                    report.failed.push((idx + 1, url.clone()));
                }
            }
        }

        info!(
            summary = %report.summary_line(),
            failed = report.failed.len(),
            interrupted = report.interrupted,
            "Batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::chain::ChainDriver;
    use crate::downloader::presets::PresetBuilder;
    use crate::downloader::test_helpers::{ok, rejected, ScriptedExecutor};
    use std::sync::Arc;

    fn downloader(exec: &ScriptedExecutor) -> Downloader {
        Downloader::new(
            PresetBuilder::new("/downloads"),
            ChainDriver::new(Arc::new(exec.clone()), "yt-dlp"),
        )
    }

    fn urls(raw: &[&str]) -> Vec<MediaUrl> {
        raw.iter().map(|u| validate_url(u).unwrap()).collect()
    }

    #[test]
    fn test_parse_skips_comments_blanks_and_invalid() {
        let list =
            parse_url_list("# comment\n\nhttps://youtube.com/x\nnotaurl\nhttps://tiktok.com/y").unwrap();
        let parsed: Vec<&str> = list.urls.iter().map(MediaUrl::as_str).collect();
        assert_eq!(parsed, vec!["https://youtube.com/x", "https://tiktok.com/y"]);
        assert_eq!(list.skipped.len(), 1);
        assert_eq!(list.skipped[0].line, 4);
        assert_eq!(list.skipped[0].content, "notaurl");
    }

    #[test]
    fn test_parse_trims_lines() {
        let list = parse_url_list("   https://youtube.com/x   \r\n\t# indented comment\n").unwrap();
        assert_eq!(list.urls[0].as_str(), "https://youtube.com/x");
        assert!(list.skipped.is_empty());
    }

    #[test]
    fn test_parse_nothing_valid() {
        for content in ["", "# only\n\n", "notaurl\nftp://x.example.com"] {
            assert!(matches!(parse_url_list(content), Err(DownloadError::NoValidInput(_))));
        }
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_url_file(&dir.path().join("urls.txt")).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidInput(_)));
    }

    #[test]
    fn test_read_non_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(&path, [0xff, 0xfe, 0x68, 0x00]).unwrap();
        assert!(matches!(read_url_file(&path), Err(DownloadError::InvalidInput(_))));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(&path, "https://www.youtube.com/watch?v=1\n# skip\nhttps://x.com/u/status/2\n").unwrap();
        assert_eq!(read_url_file(&path).unwrap().urls.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        // only the tiktok URL succeeds
        let exec = ScriptedExecutor::new(|inv| {
            if inv.args.last().is_some_and(|u| u.contains("tiktok")) {
                ok()
            } else {
                Err(rejected())
            }
        });
        let d = downloader(&exec);
        let input = urls(&[
            "https://www.youtube.com/watch?v=a",
            "https://www.tiktok.com/@u/video/b",
            "https://www.instagram.com/reel/c/",
        ]);

        let report = BatchRunner::new(&d).run(&input, &CancellationToken::new()).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, vec![input[1].clone()]);
        assert_eq!(report.failed, vec![(1, input[0].clone()), (3, input[2].clone())]);
        assert_eq!(report.summary_line(), "1/3");
        assert!(!report.interrupted);
    }

    #[tokio::test]
    async fn test_cancelled_batch_keeps_partial_report() {
        let exec = ScriptedExecutor::new(|_| ok());
        let d = downloader(&exec);
        let input = urls(&["https://youtube.com/watch?v=1", "https://youtube.com/watch?v=2"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = BatchRunner::new(&d).run(&input, &cancel).await;
        assert!(report.interrupted);
        assert_eq!(report.processed(), 0);
        assert_eq!(report.summary_line(), "0/2");
        assert_eq!(exec.call_count(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_during_download_keeps_earlier_results() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let exec = ScriptedExecutor::new(move |inv| {
            if inv.args.last().is_some_and(|u| u.contains("v=2")) {
                trigger.cancel();
            }
            ok()
        })
        .hanging_when(|inv| inv.args.last().is_some_and(|u| u.contains("v=2")));
        let d = downloader(&exec);
        let input = urls(&[
            "https://youtube.com/watch?v=1",
            "https://youtube.com/watch?v=2",
            "https://youtube.com/watch?v=3",
        ]);

        let report = BatchRunner::new(&d).run(&input, &cancel).await;

        assert_eq!(report.succeeded, vec![input[0].clone()]);
        assert!(report.failed.is_empty());
        assert!(report.interrupted);
        assert_eq!(report.summary_line(), "1/3");
        // url 3 never started
        assert_eq!(exec.call_count(), 2);
    }

    #[test]
    fn test_failed_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = urls(&["https://youtube.com/watch?v=1", "https://tiktok.com/@u/video/2"]);
        let report = BatchReport {
            total: 3,
            succeeded: Vec::new(),
            failed: vec![(1, input[0].clone()), (3, input[1].clone())],
            interrupted: false,
        };

        let path = report.write_failed_report(dir.path(), DEFAULT_FAILED_REPORT).unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(
            written,
            "# URLs that failed to download\n# Total: 2\n\n\
             https://youtube.com/watch?v=1\nhttps://tiktok.com/@u/video/2\n"
        );

        // the report is itself a valid batch input
        assert_eq!(parse_url_list(&written).unwrap().urls, input);
    }
}
