use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default wall-clock bound for a single command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one command execution. Failures are encoded here,
/// never raised: the turn loop folds them back into the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    pub output: String,
    pub error: String,
}

impl ExecutionReport {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: error.into(),
        }
    }

    /// Single text payload for feeding back into the next prompt.
    /// On failure the error text takes precedence, output preserved after it.
    pub fn folded(&self) -> String {
        if self.success {
            self.output.clone()
        } else if self.output.is_empty() {
            self.error.clone()
        } else {
            format!("{}\n{}", self.error, self.output)
        }
    }
}

/// Abstract "run this command string" seam; the concrete shell binding is
/// an external concern to the turn loop.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> ExecutionReport;
}

/// Runs commands through `sh -c` with a fixed timeout.
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> ExecutionReport {
        if command.trim().is_empty() {
            return ExecutionReport::failure("No command provided");
        }

        tracing::debug!(command = %command, "executing command");

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                tracing::warn!(command = %command, "command timed out");
                return ExecutionReport::failure(format!(
                    "Command timed out after {} seconds",
                    self.timeout.as_secs()
                ));
            }
            Ok(Err(e)) => {
                return ExecutionReport::failure(format!("Failed to launch command: {e}"));
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            ExecutionReport {
                success: true,
                output: stdout,
                error: stderr,
            }
        } else {
            let error = if stderr.is_empty() {
                format!("Command failed with {}", output.status)
            } else {
                stderr
            };
            ExecutionReport {
                success: false,
                output: stdout,
                error,
            }
        }
    }
}
