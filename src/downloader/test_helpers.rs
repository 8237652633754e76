// Scripted executor shared by the unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::errors::AttemptFailure;
use super::traits::{ExecOutput, Executor, Invocation};

type Rule = dyn Fn(&Invocation) -> Result<ExecOutput, AttemptFailure> + Send + Sync;
type Hang = dyn Fn(&Invocation) -> bool + Send + Sync;

/// Executor whose answers come from a closure; records every invocation
#[derive(Clone)]
pub struct ScriptedExecutor {
    rule: Arc<Rule>,
    hang: Arc<Hang>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedExecutor {
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ExecOutput, AttemptFailure> + Send + Sync + 'static,
    {
        Self {
            rule: Arc::new(rule),
            hang: Arc::new(|_| false),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer the n-th call with `results[n]`; calls past the end fail
    pub fn sequence(results: Vec<Result<ExecOutput, AttemptFailure>>) -> Self {
        let counter = Arc::new(Mutex::new(0usize));
        Self::new(move |_| {
            let mut n = counter.lock().unwrap();
            let result = results.get(*n).cloned().unwrap_or_else(|| Err(rejected()));
            *n += 1;
            result
        })
    }

    /// Invocations matching `when` run the rule, then never finish
    pub fn hanging_when<F>(mut self, when: F) -> Self
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.hang = Arc::new(when);
        self
    }

    pub fn always_fail() -> Self {
        Self::new(|_| Err(rejected()))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, AttemptFailure> {
        self.calls.lock().unwrap().push(invocation.clone());
        let result = (self.rule)(invocation);
        if (self.hang)(invocation) {
            std::future::pending::<()>().await;
        }
        result
    }
}

pub fn ok() -> Result<ExecOutput, AttemptFailure> {
    Ok(ExecOutput::default())
}

pub fn rejected() -> AttemptFailure {
    AttemptFailure::NonZeroExit {
        code: Some(1),
        stderr: "ERROR: scripted failure".to_string(),
    }
}
