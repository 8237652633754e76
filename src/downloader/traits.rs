// Executor trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::errors::AttemptFailure;

/// One invocation of the external tool: `<program> <args...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Pipe stdout back to the caller instead of inheriting the console
    pub capture: bool,
    pub timeout: Duration,
}

impl Invocation {
    /// Command line as it would be typed, for logging
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }
}

/// What a successful (zero exit) invocation produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Stdout text when the invocation captured output
    pub stdout: Option<String>,
}

/// Runs the external download tool.
///
/// Implementations block the calling task until the process exits or the
/// invocation's timeout elapses. A non-zero exit, a spawn error and a
/// timeout are all reported as [`AttemptFailure`], never as a panic.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Name of the executor (for logging)
    fn name(&self) -> &'static str;

    async fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, AttemptFailure>;
}
