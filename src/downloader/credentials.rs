// Session credential (cookies.txt) references

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::errors::{DownloadError, Result};

/// Bytes inspected when checking that a cookie file has content
const HEAD_BYTES: u64 = 100;

/// Validated path to a cookie store. Only ever referenced, never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialReference {
    path: PathBuf,
}

impl CredentialReference {
    /// Resolve `path` (with `~` expansion) and check it is usable.
    ///
    /// The file must exist and its first 100 bytes must be UTF-8 text
    /// containing at least one non-whitespace character.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref();
        if raw.as_os_str().is_empty() {
            return Err(DownloadError::InvalidInput(
                "a cookies file path is required".to_string(),
            ));
        }

        let expanded = expand_home(raw);
        if !expanded.is_file() {
            return Err(DownloadError::InvalidInput(format!(
                "cookies file not found: {} (looked for {})",
                raw.display(),
                expanded.display()
            )));
        }

        let mut head = Vec::with_capacity(HEAD_BYTES as usize);
        File::open(&expanded)
            .and_then(|f| f.take(HEAD_BYTES).read_to_end(&mut head))
            .map_err(|e| {
                DownloadError::InvalidInput(format!(
                    "cannot read cookies file {}: {}",
                    expanded.display(),
                    e
                ))
            })?;

        let text = match std::str::from_utf8(&head) {
            Ok(text) => text,
            // the read may cut a multi-byte character in half
            Err(e) if e.error_len().is_none() => {
                std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
            }
            Err(_) => {
                return Err(DownloadError::InvalidInput(format!(
                    "cookies file is not UTF-8 text: {}",
                    expanded.display()
                )))
            }
        };

        if text.trim().is_empty() {
            return Err(DownloadError::InvalidInput(format!(
                "cookies file is empty: {}",
                expanded.display()
            )));
        }

        let path = expanded.canonicalize().unwrap_or(expanded);
        debug!(path = %path.display(), "Cookies file accepted");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Still present on disk (checked again right before a chain is built)
    pub fn is_available(&self) -> bool {
        self.path.is_file()
    }
}

pub(crate) fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
