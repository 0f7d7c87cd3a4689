//! Spawner abstraction for interpreter invocation.
//!
//! The [`Spawner`] trait decouples the turn engine from actual process
//! creation. Tests use scripted spawners that return predetermined outputs
//! without running an interpreter.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::io::process::{CommandOutput, run_command_with_timeout};

/// Parameters for one interpreter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Environment overrides on top of the inherited environment.
    pub env: Vec<(OsString, OsString)>,
    /// Working directory for the child (the game directory).
    pub workdir: PathBuf,
    /// Bytes written to stdin before it is closed. `None` gives the child a null stdin.
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Abstraction over interpreter process creation.
pub trait Spawner {
    /// Run the program to completion (or timeout) and capture its output.
    fn spawn(&self, request: &SpawnRequest) -> Result<CommandOutput>;
}

impl<S: Spawner + ?Sized> Spawner for &S {
    fn spawn(&self, request: &SpawnRequest) -> Result<CommandOutput> {
        (**self).spawn(request)
    }
}

/// Spawner that runs a real child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    #[instrument(skip_all, fields(program = %request.program.display(), timeout_secs = request.timeout.as_secs()))]
    fn spawn(&self, request: &SpawnRequest) -> Result<CommandOutput> {
        info!(workdir = %request.workdir.display(), "starting interpreter");
        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args).current_dir(&request.workdir);
        for (key, value) in &request.env {
            cmd.env(key, value);
        }

        let output = run_command_with_timeout(
            cmd,
            request.stdin.as_deref(),
            request.timeout,
            request.output_limit_bytes,
        )
        .with_context(|| format!("run interpreter {}", request.program.display()))?;

        debug!(
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            "interpreter exited"
        );
        Ok(output)
    }
}
