use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::traits::CommandRunner;
use super::types::{CommandLimits, CommandOutput};
use crate::util::RingBytes;

/// After the child exits, wait this long for both pipes to drain. A grandchild
/// that keeps a pipe open past this is abandoned.
const PUMP_GRACE: Duration = Duration::from_secs(2);

/// Runs command lines through the platform shell (`sh -c` / `cmd /C`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

fn pump<R>(mut rd: R, ring: Arc<RingBytes>) -> JoinHandle<u64>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        loop {
            match rd.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    ring.push(&buf[..n]);
                    total += n as u64;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "pipe read failed");
                    break;
                }
            }
        }
        total
    })
}

async fn drain_within(handle: Option<JoinHandle<u64>>, deadline: Instant) {
    let Some(mut handle) = handle else {
        return;
    };
    if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
        handle.abort();
    }
}

/// Both pumps share one grace window.
async fn drain(out: Option<JoinHandle<u64>>, err: Option<JoinHandle<u64>>) {
    let deadline = Instant::now() + PUMP_GRACE;
    tokio::join!(drain_within(out, deadline), drain_within(err, deadline));
}

/// Kill the child and everything it spawned. On unix the child leads its own
/// process group, so the whole group gets SIGKILL.
async fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            tracing::debug!(pid, error = %e, "killpg failed");
        }
    }

    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "kill failed");
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    fn name(&self) -> &str {
        "shell"
    }

    async fn run(&self, command: &str, cwd: &Path, limits: &CommandLimits) -> CommandOutput {
        let started = Instant::now();

        if !cwd.is_dir() {
            let err = std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("working directory not found: {}", cwd.display()),
            );
            return CommandOutput::spawn_failed(&err);
        }

        let mut cmd = shell_command(command);
        cmd.current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "spawn failed");
                return CommandOutput::spawn_failed(&e);
            }
        };

        let out_ring = RingBytes::new(limits.tail_bytes);
        let err_ring = RingBytes::new(limits.tail_bytes);
        let out_task = child.stdout.take().map(|rd| pump(rd, out_ring.clone()));
        let err_task = child.stderr.take().map(|rd| pump(rd, err_ring.clone()));

        let (exit_code, timed_out) = match tokio::time::timeout(limits.timeout, child.wait()).await
        {
            Ok(Ok(status)) => (status.code(), false),
            Ok(Err(e)) => {
                tracing::warn!(command = %command, error = %e, "wait failed");
                (None, false)
            }
            Err(_) => {
                tracing::warn!(
                    command = %command,
                    timeout_secs = limits.timeout.as_secs(),
                    "command timed out, killing"
                );
                kill_tree(&mut child).await;
                (None, true)
            }
        };

        drain(out_task, err_task).await;

        let mut stderr_tail = err_ring.to_string_lossy();
        if timed_out {
            if !stderr_tail.is_empty() && !stderr_tail.ends_with('\n') {
                stderr_tail.push('\n');
            }
            stderr_tail.push_str(&format!("timed out after {}s", limits.timeout.as_secs()));
        }

        CommandOutput {
            exit_code,
            stdout_tail: out_ring.to_string_lossy(),
            stderr_tail,
            timed_out,
            spawn_error: None,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}
