// Downloader module - platform dispatch and fallback chains around yt-dlp

pub mod backends;
pub mod batch;
pub mod chain;
pub mod credentials;
pub mod errors;
pub mod info;
pub mod models;
pub mod orchestrator;
pub mod platform;
pub mod presets;
pub mod tools;
pub mod traits;
pub mod url;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use batch::{parse_url_list, read_url_file, BatchReport, BatchRunner, UrlList};
pub use chain::{AttemptState, ChainDriver, ChainOutcome, ChainSuccess};
pub use credentials::CredentialReference;
pub use errors::{AttemptFailure, DownloadError, Result};
pub use models::{Arg, AttemptResult, MediaUrl, Preset, PresetChain};
pub use orchestrator::{ChainMode, DownloadPlan, DownloadSuccess, Downloader};
pub use platform::PlatformTag;
pub use presets::{PlatformPolicy, PresetBuilder, PresetPolicy, PresetSpec};
pub use traits::{ExecOutput, Executor, Invocation};
