//! Shell-command adapters for the benchmark and backend contracts.
//!
//! Arguments are exported to the command as environment variables under
//! their declared names; benchmark stdout is redirected to the raw output
//! path. Commands run to completion, and a non-zero exit is a run failure.

use gridbench_core::{ArgMap, BackendHandler, BenchmarkRunner, BoxError};
use std::path::Path;
use std::process::{Command, Stdio};

/// Environment variable carrying the composed backend path, when present.
const BACKEND_ENV: &str = "GRIDBENCH_BACKEND";

fn sh(command: &str, args: &ArgMap) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    for (name, value) in args {
        cmd.env(name, value.render());
    }
    cmd
}

fn check_status(command: &str, status: std::process::ExitStatus) -> Result<(), BoxError> {
    if !status.success() {
        return Err(format!("'{}' exited with {}", command, status).into());
    }
    Ok(())
}

/// A benchmark backed by one shell command.
pub struct ShellBenchmark {
    command: String,
}

impl ShellBenchmark {
    /// Wrap a shell command; its stdout becomes the raw output.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl BenchmarkRunner for ShellBenchmark {
    fn run(&self, backend: Option<&str>, out_path: &Path, args: &ArgMap) -> Result<(), BoxError> {
        let out = std::fs::File::create(out_path)?;
        let mut cmd = sh(&self.command, args);
        cmd.stdout(Stdio::from(out));
        if let Some(path) = backend {
            cmd.env(BACKEND_ENV, path);
        }
        check_status(&self.command, cmd.status()?)
    }
}

/// A backend whose lifecycle is a pair of shell commands.
pub struct ShellBackend {
    start_command: String,
    stop_command: String,
}

impl ShellBackend {
    /// Wrap a start/stop command pair. Start receives the backend's
    /// arguments as environment variables; stop receives none.
    pub fn new(start_command: impl Into<String>, stop_command: impl Into<String>) -> Self {
        Self {
            start_command: start_command.into(),
            stop_command: stop_command.into(),
        }
    }
}

impl BackendHandler for ShellBackend {
    fn start(&self, args: &ArgMap) -> Result<(), BoxError> {
        check_status(&self.start_command, sh(&self.start_command, args).status()?)
    }

    fn stop(&self) -> Result<(), BoxError> {
        check_status(&self.stop_command, sh(&self.stop_command, &ArgMap::new()).status()?)
    }
}
