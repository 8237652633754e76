// Helper functions for process execution

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::errors::AttemptFailure;

/// Exit status plus whatever was captured
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run a command with a timeout.
///
/// With `capture` the child's stdout/stderr are piped and returned; without
/// it they are inherited so the tool's own progress output reaches the
/// console. The child is killed when the timeout elapses.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    capture: bool,
    limit: Duration,
) -> Result<ProcessOutput, AttemptFailure> {
    let mut cmd = TokioCommand::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
    if capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| AttemptFailure::SpawnFailed(format!("{}: {}", program, e)))?;

    let stdout_task = child.stdout.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).await.map(|_| buf)
        })
    });
    let stderr_task = child.stderr.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).await.map(|_| buf)
        })
    });

    match timeout(limit, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout = collect(stdout_task).await;
            let stderr = collect(stderr_task).await;
            debug!(program, code = ?status.code(), "Process exited");
            Ok(ProcessOutput { status, stdout, stderr })
        }
        Ok(Err(e)) => Err(AttemptFailure::SpawnFailed(format!(
            "failed to wait for {}: {}",
            program, e
        ))),
        Err(_) => {
            warn!(program, limit_secs = limit.as_secs(), "Process timed out, killing");
            let _ = child.kill().await;
            if let Some(task) = stdout_task {
                task.abort();
            }
            if let Some(task) = stderr_task {
                task.abort();
            }
            Err(AttemptFailure::TimedOut(limit))
        }
    }
}

async fn collect(task: Option<tokio::task::JoinHandle<std::io::Result<Vec<u8>>>>) -> Vec<u8> {
    match task {
        Some(handle) => match handle.await {
            Ok(Ok(buf)) => buf,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read child output");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Output reader task failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}
