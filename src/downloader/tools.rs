use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::errors::{DownloadError, Result};
use super::utils::run_with_timeout;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

/// Locates the external download tool and keeps it up to date
pub struct ToolManager {
    executable: String,
}

impl ToolManager {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub async fn detect(&self) -> ToolInfo {
        let path = self.locate();
        let version = match &path {
            Some(p) => self.get_version(p).await,
            None => None,
        };

        ToolInfo {
            name: self.executable.clone(),
            is_available: path.is_some() && version.is_some(),
            version,
            path,
        }
    }

    /// Startup check: the tool must exist and answer `--version`
    pub async fn ensure_available(&self) -> Result<ToolInfo> {
        let info = self.detect().await;
        if info.is_available {
            info!(
                tool = %info.name,
                version = info.version.as_deref().unwrap_or("?"),
                "Download tool found"
            );
            Ok(info)
        } else {
            Err(DownloadError::MissingDependency(format!(
                "{} is not installed or not working",
                self.executable
            )))
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        let configured = Path::new(&self.executable);
        if configured.components().count() > 1 {
            return configured.is_file().then(|| configured.to_path_buf());
        }

        if let Ok(found) = which::which(&self.executable) {
            return Some(found);
        }

        // common install locations that are not always on PATH
        let mut candidates = vec![
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
        ];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".local/bin"));
        }
        candidates
            .into_iter()
            .map(|dir| dir.join(&self.executable))
            .find(|p| p.is_file())
    }

    async fn get_version(&self, path: &Path) -> Option<String> {
        let program = path.to_string_lossy();
        match run_with_timeout(&program, &["--version".to_string()], true, VERSION_TIMEOUT).await {
            Ok(out) if out.status.success() => {
                let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
                debug!(%version, "Tool version");
                (!version.is_empty()).then_some(version)
            }
            Ok(out) => {
                warn!(code = ?out.status.code(), "Version check failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Version check failed");
                None
            }
        }
    }

    /// Upgrade yt-dlp through pip
    pub async fn update(&self) -> Result<()> {
        let python = python_cmd();
        let args: Vec<String> = ["-m", "pip", "install", "--upgrade", "yt-dlp"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        info!(%python, "Updating yt-dlp");

        let output = run_with_timeout(&python, &args, false, UPDATE_TIMEOUT)
            .await
            .map_err(|e| DownloadError::MissingDependency(format!("could not run {}: {}", python, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(DownloadError::MissingDependency(format!(
                "update failed: {} -m pip exited with {:?}",
                python,
                output.status.code()
            )))
        }
    }
}

fn python_cmd() -> String {
    // e.g. SOCIAL_DL_PYTHON=/path/to/venv/bin/python
    std::env::var("SOCIAL_DL_PYTHON").unwrap_or_else(|_| "python3".to_string())
}
