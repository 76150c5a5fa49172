/// Command execution utilities shared by every gcloud call
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Result from command execution with captured output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// Create from tokio Command output
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// True when nothing but whitespace was written to stdout
    pub fn stdout_is_blank(&self) -> bool {
        self.stdout.trim().is_empty()
    }

    /// True when anything but whitespace was written to stderr
    pub fn has_stderr(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

/// Builder for executing external commands with common patterns
pub struct CommandBuilder {
    command: Command,
    context_msg: Option<String>,
    timeout: Option<Duration>,
}

impl CommandBuilder {
    /// Create a new command builder
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut command = Command::new(program);
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Self {
            command,
            context_msg: None,
            timeout: None,
        }
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Kill the process and fail if it has not finished within `limit`
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Execute and return raw output
    pub async fn output(mut self) -> Result<CommandOutput> {
        let pending = self.command.output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(output) => output,
                Err(_) => anyhow::bail!("Command timed out after {} seconds", limit.as_secs()),
            },
            None => pending.await,
        };
        let output = if let Some(ctx) = &self.context_msg {
            output.context(ctx.clone())?
        } else {
            output?
        };
        Ok(CommandOutput::from_output(output))
    }
}

/// Runs an external program and hands back whatever it printed.
///
/// Implementations must not interpret the output: a non-zero exit is reported
/// through [`CommandOutput::success`], and only a failure to run the program at
/// all (missing binary, timeout) is an `Err`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by real child processes
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Create a runner; `None` waits for every command indefinitely
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut builder = CommandBuilder::new(program)
            .args(args)
            .context(format!("Failed to execute {}", program));
        if let Some(limit) = self.timeout {
            builder = builder.timeout(limit);
        }
        builder.output().await
    }
}

/// Check if a command-line tool is installed, giving up after `timeout`
pub async fn check_tool_installed(
    tool_name: &str,
    version_args: &[&str],
    install_url: &str,
    timeout: Option<Duration>,
) -> Result<()> {
    let mut builder = CommandBuilder::new(tool_name).args(version_args);
    if let Some(limit) = timeout {
        builder = builder.timeout(limit);
    }
    let output = builder.output().await;

    match output {
        Ok(out) if out.success => Ok(()),
        _ => anyhow::bail!(
            "{} is not installed or not in PATH. Please install from {}",
            tool_name,
            install_url
        ),
    }
}
