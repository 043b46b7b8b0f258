use std::{io, process::Stdio, time::Duration};

use tokio::time::Instant;

use super::command::{BoundCommand, CommandLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// `warnings` holds whatever the compiler wrote to stderr.
    Success { warnings: Option<String> },
    Failure { status: Option<i32>, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Finished { elapsed: Duration },
    TimedOut { elapsed: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Cannot redirect stdin/stdout: {0}")]
    Redirect(#[from] fsutil::Error),

    #[error("Failed to spawn '{command}': {error}")]
    Launch {
        command: String,
        #[source]
        error: io::Error,
    },

    #[error("Failed to communicate with '{command}': {error}")]
    Wait {
        command: String,
        #[source]
        error: io::Error,
    },

    #[error("'{command}' exited with code {code}")]
    NonZeroExit {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("'{command}' was terminated by a signal")]
    Signaled {
        command: String,
        stdout: String,
        stderr: String,
    },
}

impl ExecutionError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { stderr, .. } | Self::Signaled { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { stdout, .. } | Self::Signaled { stdout, .. } => Some(stdout),
            _ => None,
        }
    }
}

/// Spawns compilers and programs under test one at a time.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    timeout: Option<Duration>,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` waits for the program forever.
    pub fn timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub async fn compile(&self, cmd: &CommandLine) -> CompileOutcome {
        let output = cmd
            .to_tokio_command()
            .stdin(Stdio::null())
            .output()
            .await;
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return CompileOutcome::Failure {
                    status: None,
                    message: format!("Failed to spawn '{}': {}", cmd, e),
                }
            }
        };

        let mut message = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.stdout.is_empty() {
            message += &String::from_utf8_lossy(&output.stdout);
        }

        if output.status.success() {
            let warnings = (!message.trim().is_empty()).then_some(message);
            CompileOutcome::Success { warnings }
        } else {
            CompileOutcome::Failure {
                status: output.status.code(),
                message,
            }
        }
    }

    pub async fn execute(&self, bound: &BoundCommand) -> Result<Execution, ExecutionError> {
        let stdin = fsutil::open_file(bound.input())?;
        let stdout = fsutil::create_file(bound.output())?;
        let command = bound.to_string();

        let mut cmd = bound.command_line().to_tokio_command();
        cmd.stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start_at = Instant::now();
        let child = cmd.spawn().map_err(|error| ExecutionError::Launch {
            command: command.clone(),
            error,
        })?;

        // Dropping the future on timeout kills the child.
        let wait = child.wait_with_output();
        let res = match self.timeout {
            None => wait.await,
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(res) => res,
                Err(_) => {
                    log::debug!("Killed after {:?}: {}", limit, command);
                    return Ok(Execution::TimedOut {
                        elapsed: start_at.elapsed(),
                    });
                }
            },
        };
        let elapsed = start_at.elapsed();
        let output = res.map_err(|error| ExecutionError::Wait {
            command: command.clone(),
            error,
        })?;

        if output.status.success() {
            return Ok(Execution::Finished { elapsed });
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let stdout = fsutil::read_to_string(bound.output()).unwrap_or_else(|e| {
            log::warn!("{}", e);
            String::new()
        });
        Err(match output.status.code() {
            Some(code) => ExecutionError::NonZeroExit {
                command,
                code,
                stdout,
                stderr,
            },
            None => ExecutionError::Signaled {
                command,
                stdout,
                stderr,
            },
        })
    }
}
