use crate::common::error::{CommandFailed, CommandSpawn, Result, U8VectorToString};
use snafu::{ensure, ResultExt};
use std::str;
use tokio::process::Command;
use tracing::debug;

/// Executes composite shell command lines without blocking other in-flight requests.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShellRunner {
    dry_run: bool,
}

impl ShellRunner {
    pub(crate) fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Runs `cmd` through `sh -c`, capturing stdout and stderr separately.
    ///
    /// Non-empty stdout counts as success regardless of the exit code, because the
    /// wrapped tools print warnings to stderr on successful runs. Otherwise a
    /// non-zero exit fails with the captured stderr, and an empty zero exit is an
    /// empty success.
    pub(crate) async fn run(&self, cmd: &str) -> Result<Option<String>> {
        if self.dry_run {
            debug!(%cmd, "Dry-run, echoing shell command");
            return Ok(Some(cmd.to_string()));
        }

        debug!(%cmd, "Running shell command");
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .await
            .context(CommandSpawn {
                cmd: cmd.to_string(),
            })?;

        let stdout = str::from_utf8(output.stdout.as_slice()).context(U8VectorToString)?;
        if !stdout.is_empty() {
            return Ok(Some(stdout.to_string()));
        }

        ensure!(
            output.status.success(),
            CommandFailed {
                std_err: str::from_utf8(output.stderr.as_slice())
                    .context(U8VectorToString)?
                    .to_string()
            }
        );

        Ok(None)
    }
}
