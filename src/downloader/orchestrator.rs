// Orchestrator - one URL through normalize, classify, build and drive

use tracing::info;

use super::chain::{ChainDriver, ChainSuccess};
use super::errors::Result;
use super::models::{MediaUrl, PresetChain};
use super::platform::PlatformTag;
use super::presets::PresetBuilder;
use super::url::normalize;

/// Which fallback list to use after the platform preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainMode {
    #[default]
    Standard,
    /// The platform's extended list (every known method for Facebook)
    Extended,
}

/// Everything decided before the first invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub url: MediaUrl,
    pub platform: PlatformTag,
    pub chain: PresetChain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSuccess {
    pub url: MediaUrl,
    pub platform: PlatformTag,
    pub winner: ChainSuccess,
}

pub struct Downloader {
    builder: PresetBuilder,
    driver: ChainDriver,
}

impl Downloader {
    pub fn new(builder: PresetBuilder, driver: ChainDriver) -> Self {
        Self { builder, driver }
    }

    pub fn builder(&self) -> &PresetBuilder {
        &self.builder
    }

    pub fn driver(&self) -> &ChainDriver {
        &self.driver
    }

    /// Normalize and classify `raw`, then build its chain
    pub fn plan(&self, raw: &str, mode: ChainMode) -> Result<DownloadPlan> {
        let url = normalize(raw)?;
        let platform = PlatformTag::classify(url.as_str());
        let chain = match mode {
            ChainMode::Standard => self.builder.build(platform),
            ChainMode::Extended => self.builder.build_extended(platform),
        };
        Ok(DownloadPlan { url, platform, chain })
    }

    pub async fn download(&self, raw: &str) -> Result<DownloadSuccess> {
        self.download_with(raw, ChainMode::Standard).await
    }

    pub async fn download_with(&self, raw: &str, mode: ChainMode) -> Result<DownloadSuccess> {
        let plan = self.plan(raw, mode)?;
        info!(
            url = %plan.url,
            platform = %plan.platform,
            presets = plan.chain.len(),
            "Starting download"
        );
        let winner = self.driver.run(&plan.url, &plan.chain).await?;
        Ok(DownloadSuccess {
            url: plan.url,
            platform: plan.platform,
            winner,
        })
    }
}
