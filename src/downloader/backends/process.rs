use async_trait::async_trait;
use tracing::debug;

use crate::downloader::errors::AttemptFailure;
use crate::downloader::traits::{ExecOutput, Executor, Invocation};
use crate::downloader::utils::run_with_timeout;

/// Runs the external tool as a real child process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, AttemptFailure> {
        debug!(program = %invocation.program, capture = invocation.capture, "Spawning");

        let output = run_with_timeout(
            &invocation.program,
            &invocation.args,
            invocation.capture,
            invocation.timeout,
        )
        .await?;

        if !output.status.success() {
            return Err(AttemptFailure::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = invocation
            .capture
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned());
        Ok(ExecOutput { stdout })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn invocation(script: &str, capture: bool) -> Invocation {
        Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            capture,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let out = ProcessExecutor::new()
            .execute(&invocation("printf 'https://cdn.example/v.mp4'", true))
            .await
            .unwrap();
        assert_eq!(out.stdout.as_deref(), Some("https://cdn.example/v.mp4"));
    }

    #[tokio::test]
    async fn test_non_capturing_returns_no_stdout() {
        let out = ProcessExecutor::new().execute(&invocation("true", false)).await.unwrap();
        assert_eq!(out.stdout, None);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let err = ProcessExecutor::new()
            .execute(&invocation("echo 'ERROR: Unsupported URL' >&2; exit 1", true))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AttemptFailure::NonZeroExit {
                code: Some(1),
                stderr: "ERROR: Unsupported URL".to_string()
            }
        );
    }
}
