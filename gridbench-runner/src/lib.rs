#![warn(missing_docs)]
//! Gridbench Runner - Matrix Orchestration
//!
//! Drives the benchmark matrix: the `Execution` orchestrator walks every
//! {backend} × {argument set} × {iteration} cell with correct lifecycle
//! ordering and immediate per-run persistence, the `Plan` driver batches
//! executions through clean/execute/parse, and `grid.toml` supplies the
//! runner configuration. Shell-command adapters cover script-based
//! benchmarks and backends.

mod config;
mod execution;
mod plan;
mod shell;

pub use config::{GridConfig, OutputConfig, RunnerConfig};
pub use execution::{ExecState, Execution};
pub use plan::Plan;
pub use shell::{ShellBackend, ShellBenchmark};

/// Initialize logging for plan runs. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        "gridbench=debug"
    } else {
        "gridbench=info"
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
