// Execution driver - walks a preset chain until one preset succeeds
//
// Presets are tried strictly in chain order, each exactly once. The first
// zero exit wins and stops the walk; later presets are never tried even if
// they might also work.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::errors::{AttemptFailure, DownloadError, Result};
use super::models::{AttemptResult, MediaUrl, Preset, PresetChain};
use super::traits::{Executor, Invocation};

/// Default bound on a single invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Position of the driver within a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    Attempting(usize),
    Succeeded(usize),
    Exhausted,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Exhausted)
    }

    /// Next state after the preset at `Attempting(i)` finished
    fn after_attempt(index: usize, succeeded: bool, chain_len: usize) -> Self {
        if succeeded {
            Self::Succeeded(index)
        } else if index + 1 < chain_len {
            Self::Attempting(index + 1)
        } else {
            Self::Exhausted
        }
    }
}

/// Full record of one chain walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub state: AttemptState,
    pub attempts: Vec<AttemptResult>,
}

impl ChainOutcome {
    pub fn winner(&self) -> Option<&AttemptResult> {
        match self.state {
            AttemptState::Succeeded(i) => self.attempts.get(i),
            _ => None,
        }
    }

    pub fn timed_out(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.failure.as_ref().is_some_and(AttemptFailure::is_timeout))
            .count()
    }
}

/// The preset that won
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSuccess {
    pub index: usize,
    pub label: String,
    /// Captured stdout of the winning preset (direct URL, JSON dump)
    pub output: Option<String>,
    pub attempts: Vec<AttemptResult>,
    /// Presets in the chain that was walked
    pub chain_len: usize,
}

/// Drives preset chains against an [`Executor`]
#[derive(Clone)]
pub struct ChainDriver {
    executor: Arc<dyn Executor>,
    program: String,
    timeout: Duration,
}

impl ChainDriver {
    pub fn new(executor: Arc<dyn Executor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// `<program> <preset args...> <url>`
    pub fn invocation(&self, preset: &Preset, url: &MediaUrl) -> Invocation {
        let mut args = preset.to_command_args();
        args.push(url.to_string());
        Invocation {
            program: self.program.clone(),
            args,
            capture: preset.captures_output(),
            timeout: self.timeout,
        }
    }

    /// Walk the chain and return the complete record
    pub async fn drive(&self, url: &MediaUrl, chain: &PresetChain) -> ChainOutcome {
        let total = chain.len();
        let mut attempts = Vec::with_capacity(total);
        let mut state = AttemptState::Pending;

        while !state.is_terminal() {
            state = match state {
                AttemptState::Pending => AttemptState::Attempting(0),
                AttemptState::Attempting(i) => {
                    let preset = &chain.presets()[i];
                    info!(url = %url, preset = preset.label(), "Method {}/{}", i + 1, total);
                    let result = self.attempt(url, preset).await;
                    let succeeded = result.succeeded;
                    attempts.push(result);
                    AttemptState::after_attempt(i, succeeded, total)
                }
                terminal => terminal,
            };
        }

        match state {
            AttemptState::Succeeded(i) => {
                info!(url = %url, preset = chain.presets()[i].label(), "Download succeeded");
            }
            _ => warn!(url = %url, attempts = attempts.len(), "Every preset failed"),
        }

        ChainOutcome { state, attempts }
    }

    /// Walk the chain; `ExhaustedChain` when nothing succeeded
    pub async fn run(&self, url: &MediaUrl, chain: &PresetChain) -> Result<ChainSuccess> {
        let outcome = self.drive(url, chain).await;
        match outcome.state {
            AttemptState::Succeeded(index) => {
                let winner = &outcome.attempts[index];
                Ok(ChainSuccess {
                    index,
                    label: winner.label.clone(),
                    output: winner.output.clone(),
                    attempts: outcome.attempts,
                    chain_len: chain.len(),
                })
            }
            _ => Err(DownloadError::ExhaustedChain {
                url: url.to_string(),
                attempts: outcome.attempts.len(),
            }),
        }
    }

    async fn attempt(&self, url: &MediaUrl, preset: &Preset) -> AttemptResult {
        let invocation = self.invocation(preset, url);
        debug!(executor = self.executor.name(), command = %invocation.display(), "Attempt");

        let result = match self.executor.execute(&invocation).await {
            Ok(out) if preset.captures_output() => {
                match out.stdout.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
                    Some(text) => Ok(Some(text)),
                    None => Err(AttemptFailure::EmptyOutput),
                }
            }
            Ok(_) => Ok(None),
            Err(failure) => Err(failure),
        };

        match result {
            Ok(output) => AttemptResult::success(preset.label(), output),
            Err(failure) => {
                let err = DownloadError::AttemptFailed {
                    label: preset.label().to_string(),
                    failure: failure.clone(),
                };
                if failure.is_timeout() {
                    warn!(url = %url, "{}", err);
                } else {
                    info!(url = %url, "{}", err);
                }
                AttemptResult::failed(preset.label(), failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::Arg;
    use crate::downloader::test_helpers::{ok, rejected, ScriptedExecutor};
    use crate::downloader::traits::ExecOutput;
    use crate::downloader::url::validate_url;

    fn chain(labels: &[&str]) -> PresetChain {
        let mut iter = labels.iter();
        let first = iter.next().unwrap();
        let mut chain = PresetChain::new(Preset::new(*first, vec![Arg::pair("--format", *first)]));
        for label in iter {
            chain.push(Preset::new(*label, vec![Arg::pair("--format", *label)]));
        }
        chain
    }

    fn url() -> MediaUrl {
        validate_url("https://www.youtube.com/watch?v=abc").unwrap()
    }

    fn driver(exec: &ScriptedExecutor) -> ChainDriver {
        ChainDriver::new(Arc::new(exec.clone()), "yt-dlp")
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let exec = ScriptedExecutor::sequence(vec![Err(rejected()), ok(), ok()]);
        let success = driver(&exec).run(&url(), &chain(&["a", "b", "c"])).await.unwrap();

        assert_eq!(exec.call_count(), 2);
        assert_eq!(success.index, 1);
        assert_eq!(success.label, "b");
        assert_eq!(success.attempts.len(), 2);
        assert_eq!(success.chain_len, 3);
    }

    #[tokio::test]
    async fn test_first_success_wins_even_if_later_would() {
        let exec = ScriptedExecutor::new(|_| ok());
        let outcome = driver(&exec).drive(&url(), &chain(&["a", "b", "c"])).await;
        assert_eq!(outcome.state, AttemptState::Succeeded(0));
        assert_eq!(exec.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_tries_each_once_in_order() {
        let exec = ScriptedExecutor::always_fail();
        let err = driver(&exec).run(&url(), &chain(&["a", "b", "c"])).await.unwrap_err();

        assert!(matches!(err, DownloadError::ExhaustedChain { attempts: 3, .. }));
        let formats: Vec<String> = exec.calls().iter().map(|c| c.args[1].clone()).collect();
        assert_eq!(formats, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_invocation_shape() {
        let exec = ScriptedExecutor::new(|_| ok());
        let d = driver(&exec).with_timeout(Duration::from_secs(7));
        d.run(&url(), &chain(&["best"])).await.unwrap();

        let call = &exec.calls()[0];
        assert_eq!(call.program, "yt-dlp");
        assert_eq!(call.args, vec!["--format", "best", "https://www.youtube.com/watch?v=abc"]);
        assert_eq!(call.timeout, Duration::from_secs(7));
        assert!(!call.capture);
    }

    #[tokio::test]
    async fn test_timeout_advances_and_is_reported() {
        let exec = ScriptedExecutor::sequence(vec![
            Err(AttemptFailure::TimedOut(DEFAULT_TIMEOUT)),
            ok(),
        ]);
        let outcome = driver(&exec).drive(&url(), &chain(&["slow", "fast"])).await;

        assert_eq!(outcome.state, AttemptState::Succeeded(1));
        assert_eq!(outcome.timed_out(), 1);
        assert_eq!(outcome.winner().unwrap().label, "fast");
    }

    #[tokio::test]
    async fn test_capturing_preset_needs_output() {
        let mut c = chain(&["base"]);
        c.push(Preset::new("direct url", vec![Arg::flag("--get-url")]).capturing());
        c.push(Preset::new("direct url again", vec![Arg::flag("--get-url")]).capturing());

        let exec = ScriptedExecutor::sequence(vec![
            Err(rejected()),
            Ok(ExecOutput { stdout: Some("  \n".to_string()) }),
            Ok(ExecOutput { stdout: Some("https://cdn.example/v.mp4\n".to_string()) }),
        ]);
        let success = driver(&exec).run(&url(), &c).await.unwrap();

        assert_eq!(success.index, 2);
        assert_eq!(success.output.as_deref(), Some("https://cdn.example/v.mp4"));
        assert_eq!(success.attempts[1].failure, Some(AttemptFailure::EmptyOutput));
        assert!(exec.calls()[1].capture);
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(AttemptState::after_attempt(0, true, 3), AttemptState::Succeeded(0));
        assert_eq!(AttemptState::after_attempt(0, false, 3), AttemptState::Attempting(1));
        assert_eq!(AttemptState::after_attempt(2, false, 3), AttemptState::Exhausted);
        assert!(!AttemptState::Pending.is_terminal());
        assert!(AttemptState::Exhausted.is_terminal());
    }
}
