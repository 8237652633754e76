// Error taxonomy for the download pipeline

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias used across the downloader
pub type Result<T> = std::result::Result<T, DownloadError>;

/// Why a single preset invocation did not succeed.
///
/// Always recovered locally by the chain driver: the next preset is tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The process did not exit within the invocation timeout
    TimedOut(Duration),
    /// The process exited with a non-zero status (None = killed by signal)
    NonZeroExit { code: Option<i32>, stderr: String },
    /// The process could not be started at all
    SpawnFailed(String),
    /// A capturing preset exited cleanly but printed nothing
    EmptyOutput,
}

impl AttemptFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(limit) => write!(f, "took too long (limit {}s)", limit.as_secs()),
            Self::NonZeroExit { code: Some(code), stderr } if !stderr.is_empty() => {
                write!(f, "rejected with exit code {}: {}", code, stderr.trim())
            }
            Self::NonZeroExit { code: Some(code), .. } => write!(f, "rejected with exit code {}", code),
            Self::NonZeroExit { code: None, .. } => write!(f, "terminated by signal"),
            Self::SpawnFailed(msg) => write!(f, "could not start: {}", msg),
            Self::EmptyOutput => write!(f, "exited cleanly but produced no output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Malformed URL, missing file or unreadable credential file
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external download tool is absent or unusable
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// One preset failed; never escapes the chain driver on its own
    #[error("preset '{label}' failed: {failure}")]
    AttemptFailed { label: String, failure: AttemptFailure },

    /// Every preset of a chain was tried once and none succeeded
    #[error("all {attempts} presets failed for {url}")]
    ExhaustedChain { url: String, attempts: usize },

    /// A batch source produced zero usable URLs
    #[error("no valid URLs found: {0}")]
    NoValidInput(String),

    /// Configuration file could not be parsed or failed validation
    #[error("configuration error: {0}")]
    Config(String),

    /// Stopped with Ctrl-C while the operation was running
    #[error("interrupted by user")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Remediation hints shown next to the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidInput(_) => vec![
                "Copy the full URL from your browser",
                "URLs must start with http:// or https://",
                "Check that the file path is correct",
            ],
            Self::MissingDependency(_) => vec![
                "Install yt-dlp: python3 -m pip install yt-dlp",
                "Or point the `executable` setting at an existing binary",
                "See https://github.com/yt-dlp/yt-dlp",
            ],
            Self::AttemptFailed { failure, .. } if failure.is_timeout() => vec![
                "The file may be very large or the connection slow",
                "Raise the timeout with --timeout",
            ],
            Self::AttemptFailed { .. } | Self::ExhaustedChain { .. } => vec![
                "Check that the video exists and is accessible",
                "Private videos need a cookies file (--cookies)",
                "Update yt-dlp with the `update` command",
                "For Facebook, try the `facebook` command for more methods",
            ],
            Self::NoValidInput(_) => vec![
                "Put one URL per line",
                "Lines starting with # are treated as comments",
                "Every URL must start with http:// or https://",
            ],
            Self::Config(_) => vec!["Fix the reported keys in the configuration file"],
            Self::Interrupted => vec!["Run the command again to retry the video"],
            Self::Io(_) => vec![
                "Check write permissions on the output directory",
                "Choose a different destination folder",
            ],
        }
    }
}
