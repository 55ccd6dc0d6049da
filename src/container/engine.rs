use std::io;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use super::commands::{logs_args, run_args, stop_args};
use super::follow::LogFollower;
use super::types::{ContainerHandle, LaunchSpec, LineRead};

/// A stream of output lines that can be waited on for a bounded time.
pub trait LineSource {
    /// Wait at most `timeout` for the next line.
    fn next_line(&mut self, timeout: Duration) -> io::Result<LineRead>;

    /// Ask the producer to stop. Called once when streaming ends.
    fn terminate(&mut self);
}

/// The container runtime operations a smoke test needs.
pub trait ContainerRuntime {
    type Logs: LineSource;

    /// Start the container detached. The error carries the runtime's
    /// diagnostic output.
    fn start(&self, spec: &LaunchSpec) -> Result<()>;

    /// Follow the container's combined output.
    fn follow_logs(&self, handle: &ContainerHandle) -> Result<Self::Logs>;

    /// Request the container to stop.
    fn stop(&self, handle: &ContainerHandle) -> Result<()>;

    /// The start invocation in shell-quoted form, for the operator logs.
    fn render_start(&self, spec: &LaunchSpec) -> String {
        shell_words::join(run_args(spec))
    }
}

/// Runtime driven through its command-line client, e.g. `sudo podman`.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    program: String,
    prefix: Vec<String>,
}

impl CliRuntime {
    /// Parse a runtime invocation using shell quoting rules.
    pub fn parse(invocation: &str) -> Result<Self> {
        let mut words = shell_words::split(invocation)
            .with_context(|| format!("invalid runtime command `{invocation}`"))?
            .into_iter();
        let Some(program) = words.next() else {
            bail!("runtime command is empty");
        };
        Ok(Self {
            program,
            prefix: words.collect(),
        })
    }

    /// Render a full invocation for logging.
    pub fn render(&self, args: &[String]) -> String {
        let words: Vec<&str> = std::iter::once(self.program.as_str())
            .chain(self.prefix.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .collect();
        shell_words::join(words)
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix).args(args);
        cmd
    }
}

impl ContainerRuntime for CliRuntime {
    type Logs = LogFollower;

    fn start(&self, spec: &LaunchSpec) -> Result<()> {
        let args = run_args(spec);
        tracing::info!("Running container: {}", self.render(&args));
        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to invoke `{}`", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                bail!("runtime exited with {}", output.status);
            }
            bail!("runtime exited with {}: {stderr}", output.status);
        }
        Ok(())
    }

    fn render_start(&self, spec: &LaunchSpec) -> String {
        self.render(&run_args(spec))
    }

    fn follow_logs(&self, handle: &ContainerHandle) -> Result<LogFollower> {
        LogFollower::spawn(self.command(&logs_args(handle)))
    }

    fn stop(&self, handle: &ContainerHandle) -> Result<()> {
        let output = self
            .command(&stop_args(handle))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to invoke `{}`", self.program))?;

        if !output.status.success() {
            bail!(
                "stop exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
