use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::stream::OutputStream;
use crate::types::{InvokeOptions, OutputChunk};
use crate::{AmpAgentError, Result};

/// Capacity of the channel between the pipe readers and the consumer.
const CHANNEL_CAPACITY: usize = 64;

// ─── AmpProcess ───────────────────────────────────────────────────────────

/// A running `amp -x <prompt>` subprocess.
///
/// Stdout and stderr are each drained by a background task that forwards
/// complete lines into the [`OutputStream`] returned alongside the process.
/// Stdin is closed: the prompt travels as an argument, and concurrent
/// invocations must never contend for the terminal.
pub(crate) struct AmpProcess {
    child: Child,
}

impl AmpProcess {
    /// Spawn the assistant with `prompt` according to `opts`.
    pub(crate) fn spawn(prompt: &str, opts: &InvokeOptions) -> Result<(Self, OutputStream)> {
        let cmd = build_command(prompt, opts);
        Self::from_command(cmd).map_err(|e| match e {
            AmpAgentError::Io(source) => AmpAgentError::Spawn {
                executable: opts.executable.clone(),
                source,
            },
            other => other,
        })
    }

    /// Spawn an arbitrary command in place of the assistant.
    /// Used in unit tests to drive the runner with `sh -c` scripts.
    #[cfg(test)]
    pub(crate) fn spawn_command(cmd: Command) -> Result<(Self, OutputStream)> {
        Self::from_command(cmd)
    }

    fn from_command(mut cmd: Command) -> Result<(Self, OutputStream)> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AmpAgentError::Process("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AmpAgentError::Process("stderr not captured".into()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        forward_lines(stdout, tx.clone(), OutputChunk::Stdout);
        forward_lines(stderr, tx, OutputChunk::Stderr);

        tracing::debug!(pid = ?child.id(), "amp process spawned");
        Ok((Self { child }, OutputStream::from_channel(rx)))
    }

    /// Wait for the child to exit and map its status to an exit code.
    pub(crate) async fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().await?;
        Ok(exit_code(status))
    }

    /// Kill the subprocess (best-effort; errors are ignored).
    pub(crate) async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!(error = %e, "kill after exit or failure");
        }
    }
}

/// Forward each line read from `reader` into `tx` until EOF or until the
/// receiver goes away. Invalid UTF-8 is replaced rather than ending the read,
/// so the pipe is always drained.
fn forward_lines<R>(reader: R, tx: mpsc::Sender<OutputChunk>, wrap: fn(String) -> OutputChunk)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(|c| c == '\n' || c == '\r')
                        .to_string();
                    if tx.send(wrap(line)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

// ─── Command builder ──────────────────────────────────────────────────────

fn build_command(prompt: &str, opts: &InvokeOptions) -> Command {
    let mut cmd = Command::new(&opts.executable);
    cmd.arg("-x").arg(prompt);

    for (k, v) in &opts.env {
        cmd.env(k, v);
    }

    if let Some(cwd) = &opts.cwd {
        cmd.current_dir(cwd);
    }

    cmd
}
