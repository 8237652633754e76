// Ctrl-C routing
//
// One SIGINT listener lives for the whole process. While an operation runs,
// Ctrl-C cancels that operation's token; with nothing running it exits.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Exit status for a process stopped by SIGINT
const SIGINT_EXIT: i32 = 130;

#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running operation and return its token
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    /// The running operation is over
    pub fn finish(&self) {
        *self.slot() = None;
    }

    /// Cancel the running operation; false when nothing is running
    pub fn trigger(&self) -> bool {
        match self.slot().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Listen for Ctrl-C until the process ends
    pub async fn watch(self) {
        while tokio::signal::ctrl_c().await.is_ok() {
            if self.trigger() {
                info!("Interrupt received, stopping current operation");
            } else {
                std::process::exit(SIGINT_EXIT);
            }
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
