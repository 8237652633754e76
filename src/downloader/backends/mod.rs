// Executor backends

pub mod process;

pub use process::ProcessExecutor;
