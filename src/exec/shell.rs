//! Subprocess execution with output capture and timeout enforcement.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::ExecError;

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Run `command` via `sh -c` in `working_dir`.
///
/// The child gets its own process group and a closed stdin, so it neither
/// receives the terminal's Ctrl-C nor blocks waiting for input. If it runs
/// longer than `timeout_secs` the whole group is killed and the result is
/// returned with `timed_out` set and whatever output was captured so far.
///
/// A non-zero exit is not an error here; callers decide what it means.
pub async fn execute_shell(
    command: &str,
    working_dir: &Path,
    timeout_secs: u64,
) -> Result<ExecResult, ExecError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::SpawnFailed(e.to_string()))?;

    let pid = child.id();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::SpawnFailed("stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::SpawnFailed("stderr not captured".to_string()))?;

    let stdout_task = spawn_reader(stdout);
    let stderr_task = spawn_reader(stderr);

    let waited = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await;

    let (exit_code, timed_out) = match waited {
        Ok(Ok(status)) => (status.code(), false),
        Ok(Err(e)) => return Err(ExecError::SpawnFailed(e.to_string())),
        Err(_) => {
            tracing::warn!(command, timeout_secs, "Command timed out, killing process group");
            if let Some(pid) = pid {
                if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    tracing::debug!("killpg failed: {}", e);
                }
            }
            // Reap the shell so it does not linger as a zombie.
            let _ = child.kill().await;
            (None, true)
        }
    };

    Ok(ExecResult {
        stdout: collect_reader(stdout_task).await,
        stderr: collect_reader(stderr_task).await,
        exit_code,
        timed_out,
    })
}

fn spawn_reader<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            tracing::debug!("Output stream read failed: {}", e);
        }
        buf
    })
}

async fn collect_reader(task: JoinHandle<Vec<u8>>) -> String {
    match task.await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!("Output reader task failed: {}", e);
            String::new()
        }
    }
}
