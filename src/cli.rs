use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;

/// Download videos from social platforms through yt-dlp, retrying with
/// alternate presets when a platform rejects the first attempt.
#[derive(Debug, Clone, Parser)]
#[command(name = "social-downloader", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// TOML configuration file.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Directory where videos are saved.
    #[arg(long, short = 'o', global = true)]
    pub output_dir: Option<PathBuf>,

    /// Netscape cookies.txt exported from a logged-in browser.
    #[arg(long, global = true)]
    pub cookies: Option<PathBuf>,

    /// Seconds before a single attempt is abandoned.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// yt-dlp binary name or path.
    #[arg(long, global = true)]
    pub executable: Option<String>,

    /// Verbose logging (debug level).
    #[arg(long, short = 'v', global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Download a single video.
    Get {
        url: String,
    },
    /// Download every URL listed in a text file, one per line.
    Batch {
        file: PathBuf,

        /// Write the failed URLs to the report file without asking.
        #[arg(long)]
        save_failed: bool,
    },
    /// Download a Facebook video trying every known method.
    Facebook {
        url: String,
    },
    /// Show title, duration and formats without downloading.
    Info {
        url: String,
    },
    /// Upgrade yt-dlp through pip.
    Update,
    /// Check that yt-dlp is installed and print its version.
    Check,
    /// Interactive menu (default).
    Menu,
}

impl Commands {
    /// Commands that need yt-dlp present up front; checked once at startup
    pub fn needs_tool(&self) -> bool {
        !matches!(self, Self::Update | Self::Check)
    }
}

impl Args {
    /// Apply flag overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(cookies) = &self.cookies {
            config.cookies = Some(cookies.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(exe) = &self.executable {
            config.executable = exe.clone();
        }
    }

    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "social_downloader=debug"
        } else {
            "social_downloader=info"
        }
    }
}
