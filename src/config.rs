//! Configuration for social-downloader
//!
//! Everything here is passed explicitly into the preset builder and the
//! chain driver; nothing is held in global state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::downloader::batch::DEFAULT_FAILED_REPORT;
use crate::downloader::credentials::{expand_home, CredentialReference};
use crate::downloader::{DownloadError, PlatformPolicy, PlatformTag, PresetBuilder, PresetPolicy, Result};

/// Env var that overrides the executable name/path
pub const EXECUTABLE_ENV: &str = "SOCIAL_DL_YTDLP";

fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Videos")
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where downloaded files and the failed-URL report are written
    pub output_dir: PathBuf,
    /// yt-dlp binary name or path
    pub executable: String,
    /// Bound on a single invocation, in seconds
    pub timeout_secs: u64,
    /// Netscape cookies.txt used for private videos
    pub cookies: Option<PathBuf>,
    /// Subtitle languages embedded by the base preset
    pub subtitle_langs: String,
    /// File name of the failed-URL report
    pub failed_report_name: String,
    /// Per-platform replacements for the built-in preset table
    pub presets: BTreeMap<PlatformTag, PlatformPolicy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            executable: "yt-dlp".to_string(),
            timeout_secs: 300,
            cookies: None,
            subtitle_langs: "es,en".to_string(),
            failed_report_name: DEFAULT_FAILED_REPORT.to_string(),
            presets: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let resolved = expand_home(path);
        if !resolved.is_file() {
            return Err(DownloadError::InvalidInput(format!(
                "config file not found: {}",
                resolved.display()
            )));
        }
        let content = std::fs::read_to_string(&resolved)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| DownloadError::Config(format!("failed to parse config: {}", e)))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Explicit file, else the per-user file if present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::user_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                let mut config = Self::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("social-downloader").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(exe) = std::env::var(EXECUTABLE_ENV) {
            if !exe.trim().is_empty() {
                self.executable = exe;
            }
        }
    }

    /// Validate all fields, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.executable.trim().is_empty() {
            errors.push("executable must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            errors.push("timeout_secs must be positive".to_string());
        }
        if self.subtitle_langs.trim().is_empty() {
            errors.push("subtitle_langs must not be empty".to_string());
        }
        if self.failed_report_name.is_empty()
            || self.failed_report_name.contains(['/', '\\'])
        {
            errors.push("failed_report_name must be a plain file name".to_string());
        }
        for (tag, policy) in &self.presets {
            let specs = policy
                .preset
                .iter()
                .chain(&policy.fallbacks)
                .chain(&policy.extended);
            for spec in specs {
                if spec.label.trim().is_empty() {
                    errors.push(format!("presets.{}: every preset needs a label", tag));
                }
                if spec.args.iter().any(|a| a.flag.is_empty()) {
                    errors.push(format!("presets.{}.{}: empty flag", tag, spec.label));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DownloadError::Config(errors.join("; ")))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_home(&self.output_dir)
    }

    pub fn policy(&self) -> PresetPolicy {
        PresetPolicy::default().with_overrides(&self.presets)
    }

    /// Resolve the configured cookie file, if any
    pub fn credentials(&self) -> Result<Option<CredentialReference>> {
        self.cookies
            .as_deref()
            .map(CredentialReference::resolve)
            .transpose()
    }

    pub fn preset_builder(&self, credentials: Option<CredentialReference>) -> PresetBuilder {
        PresetBuilder::new(self.output_dir())
            .with_credentials(credentials)
            .with_subtitle_langs(self.subtitle_langs.clone())
            .with_policy(self.policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert!(config.output_dir.ends_with("Videos"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("timeout_secs = 60\noutput_dir = \"/srv/videos\"\n").unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.output_dir, PathBuf::from("/srv/videos"));
        assert_eq!(config.subtitle_langs, "es,en");
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let err = Config::from_toml("timeout_secs = 0\nfailed_report_name = \"a/b.txt\"\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("timeout_secs"));
        assert!(msg.contains("failed_report_name"));
    }

    #[test]
    fn test_preset_overrides_reach_builder() {
        let config = Config::from_toml(
            r#"
            output_dir = "/srv/videos"

            [presets.twitter]
            preset = { label = "twitter", args = [["--format", "best[ext=mp4]"]] }
            fallbacks = [{ label = "simplified", args = [["--format", "best"]] }]
            "#,
        )
        .unwrap();

        let chain = config.preset_builder(None).build(PlatformTag::Twitter);
        assert_eq!(chain.labels(), vec!["base", "twitter", "simplified"]);
        assert_eq!(chain.base().value_of("-o"), Some("/srv/videos/%(title)s.%(ext)s"));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(Config::from_toml("timeout_secs = \"soon\""), Err(DownloadError::Config(_))));
    }

    #[test]
    fn test_missing_cookie_file_is_invalid_input() {
        let config = Config {
            cookies: Some(PathBuf::from("/nonexistent/cookies.txt")),
            ..Config::default()
        };
        assert!(matches!(config.credentials(), Err(DownloadError::InvalidInput(_))));
    }
}
