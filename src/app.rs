// Application layer: wires configuration into the downloader and runs the
// individual commands. Console output lives in the callers.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Config;
use crate::downloader::backends::ProcessExecutor;
use crate::downloader::info::{fetch_video_info, VideoInfo};
use crate::downloader::tools::{ToolInfo, ToolManager};
use crate::downloader::url::normalize;
use crate::downloader::{
    read_url_file, BatchReport, BatchRunner, ChainDriver, ChainMode, CredentialReference,
    DownloadError, DownloadSuccess, Downloader, Executor, PlatformTag, Result, UrlList,
};
use crate::interrupt::Interrupts;

pub struct App {
    config: Config,
    executor: Arc<dyn Executor>,
    downloader: Downloader,
    tools: ToolManager,
    interrupts: Interrupts,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_executor(config, Arc::new(ProcessExecutor))
    }

    pub fn with_executor(config: Config, executor: Arc<dyn Executor>) -> Result<Self> {
        let credentials = config.credentials()?;
        let downloader = build_downloader(&config, executor.clone(), credentials);
        let tools = ToolManager::new(config.executable.clone());
        Ok(Self {
            config,
            executor,
            downloader,
            tools,
            interrupts: Interrupts::new(),
        })
    }

    /// Handle for the process-wide Ctrl-C listener
    pub fn interrupts(&self) -> &Interrupts {
        &self.interrupts
    }

    /// Run `operation`, abandoning it when Ctrl-C arrives
    async fn cancellable<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        let token = self.interrupts.begin();
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(DownloadError::Interrupted),
            result = operation => result,
        };
        self.interrupts.finish();
        result
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> Option<&CredentialReference> {
        self.downloader.builder().credentials()
    }

    /// Validate and switch to a new cookie file; `None` clears it
    pub fn set_credentials(&mut self, path: Option<&Path>) -> Result<()> {
        let credentials = path.map(CredentialReference::resolve).transpose()?;
        self.config.cookies = credentials.as_ref().map(|c| c.path().to_path_buf());
        self.downloader = build_downloader(&self.config, self.executor.clone(), credentials);
        Ok(())
    }

    pub async fn check(&self) -> Result<ToolInfo> {
        self.tools.ensure_available().await
    }

    pub async fn update(&self) -> Result<()> {
        self.cancellable(self.tools.update()).await
    }

    fn prepare_output_dir(&self) -> Result<PathBuf> {
        let dir = self.config.output_dir();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Output directory ready");
        Ok(dir)
    }

    pub async fn download(&self, url: &str, mode: ChainMode) -> Result<DownloadSuccess> {
        self.prepare_output_dir()?;
        self.cancellable(self.downloader.download_with(url, mode)).await
    }

    /// Extended chain; non-Facebook URLs get their platform's fallbacks
    pub async fn download_facebook(&self, url: &str) -> Result<DownloadSuccess> {
        let plan = self.downloader.plan(url, ChainMode::Extended)?;
        if plan.platform != PlatformTag::Facebook {
            warn!(url = %plan.url, platform = %plan.platform, "Not a Facebook URL");
        }
        self.download(url, ChainMode::Extended).await
    }

    pub async fn info(&self, url: &str) -> Result<VideoInfo> {
        let url = normalize(url)?;
        self.cancellable(fetch_video_info(self.downloader.driver(), &url)).await
    }

    pub fn load_batch(&self, file: &Path) -> Result<UrlList> {
        read_url_file(file)
    }

    /// Run a batch; Ctrl-C stops it and the partial report is returned
    pub async fn batch(&self, list: &UrlList) -> Result<BatchReport> {
        self.prepare_output_dir()?;

        let cancel = self.interrupts.begin();
        let report = BatchRunner::new(&self.downloader)
            .run(&list.urls, &cancel)
            .await;
        self.interrupts.finish();
        Ok(report)
    }

    pub fn save_failed(&self, report: &BatchReport) -> Result<PathBuf> {
        report.write_failed_report(&self.config.output_dir(), &self.config.failed_report_name)
    }
}

fn build_downloader(
    config: &Config,
    executor: Arc<dyn Executor>,
    credentials: Option<CredentialReference>,
) -> Downloader {
    let driver =
        ChainDriver::new(executor, config.executable.clone()).with_timeout(config.timeout());
    Downloader::new(config.preset_builder(credentials), driver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::batch::parse_url_list;
    use crate::downloader::test_helpers::{ok, rejected, ScriptedExecutor};

    fn app(exec: &ScriptedExecutor, dir: &Path) -> App {
        let config = Config {
            output_dir: dir.to_path_buf(),
            executable: "yt-dlp".to_string(),
            timeout_secs: 42,
            ..Config::default()
        };
        App::with_executor(config, Arc::new(exec.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_download_uses_configured_timeout_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("videos");
        let exec = ScriptedExecutor::sequence(vec![ok()]);
        let app = app(&exec, &out);

        app.download("https://www.youtube.com/watch?v=abc", ChainMode::Standard)
            .await
            .unwrap();

        assert!(out.is_dir());
        let call = &exec.calls()[0];
        assert_eq!(call.timeout.as_secs(), 42);
        assert!(call.args.iter().any(|a| a.starts_with(&out.to_string_lossy().to_string())));
    }

    #[tokio::test]
    async fn test_facebook_uses_extended_chain() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::always_fail();
        let app = app(&exec, dir.path());

        let err = app
            .download_facebook("https://www.facebook.com/watch/?v=1")
            .await
            .unwrap_err();

        let standard = app
            .downloader
            .plan("https://www.facebook.com/watch/?v=1", ChainMode::Standard)
            .unwrap()
            .chain
            .len();
        match err {
            DownloadError::ExhaustedChain { attempts, .. } => assert!(attempts > standard),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_interrupt_cancels_running_download() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new(|_| ok()).hanging_when(|_| true);
        let app = app(&exec, dir.path());

        let (result, triggered) = tokio::join!(
            app.download("https://www.youtube.com/watch?v=abc", ChainMode::Standard),
            async {
                while exec.call_count() == 0 {
                    tokio::task::yield_now().await;
                }
                app.interrupts().trigger()
            }
        );

        assert!(triggered);
        assert!(matches!(result, Err(DownloadError::Interrupted)));
        // nothing is running any more
        assert!(!app.interrupts().trigger());
        assert_eq!(exec.call_count(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_after_batch_reaches_next_download() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new(|_| ok())
            .hanging_when(|inv| inv.args.last().is_some_and(|u| u.contains("single")));
        let app = app(&exec, dir.path());
        let list = parse_url_list("https://www.youtube.com/watch?v=batch\n").unwrap();

        let report = app.batch(&list).await.unwrap();
        assert_eq!(report.summary_line(), "1/1");
        assert!(!app.interrupts().trigger());

        let (result, triggered) = tokio::join!(
            app.download("https://www.youtube.com/watch?v=single", ChainMode::Standard),
            async {
                while exec.call_count() < 2 {
                    tokio::task::yield_now().await;
                }
                app.interrupts().trigger()
            }
        );
        assert!(triggered);
        assert!(matches!(result, Err(DownloadError::Interrupted)));
    }

    #[tokio::test]
    async fn test_batch_and_failed_report() {
        let dir = tempfile::tempdir().unwrap();
        let exec = ScriptedExecutor::new(|inv| {
            if inv.args.last().is_some_and(|u| u.contains("youtube")) {
                ok()
            } else {
                Err(rejected())
            }
        });
        let app = app(&exec, dir.path());
        let list = parse_url_list(
            "https://www.youtube.com/watch?v=1\nhttps://www.tiktok.com/@u/video/2\n",
        )
        .unwrap();

        let report = app.batch(&list).await.unwrap();
        assert_eq!(report.summary_line(), "1/2");

        let path = app.save_failed(&report).unwrap();
        assert_eq!(path, dir.path().join("failed_urls.txt"));
        assert!(fs::read_to_string(path).unwrap().contains("https://www.tiktok.com/@u/video/2"));
    }

    #[test]
    fn test_set_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let cookies = dir.path().join("cookies.txt");
        fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        let mut app = app(&ScriptedExecutor::always_fail(), dir.path());

        assert!(app.set_credentials(Some(&dir.path().join("missing.txt"))).is_err());
        assert!(app.credentials().is_none());

        app.set_credentials(Some(&cookies)).unwrap();
        assert!(app.credentials().is_some());
        assert!(app.config().cookies.is_some());

        app.set_credentials(None).unwrap();
        assert!(app.credentials().is_none());
    }
}
