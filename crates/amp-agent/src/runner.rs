use std::path::Path;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::process::AmpProcess;
use crate::stream::OutputStream;
use crate::types::{CaptureBuffer, InvokeOptions, OutputChunk, RunResult, TIMEOUT_EXIT_CODE};
use crate::{AmpAgentError, Result};

/// Prompt used by [`probe`] to confirm the assistant answers at all.
pub const PROBE_PROMPT: &str =
    "Hello, please respond with \"Amp CLI is working\" to confirm functionality.";

// ─── RunConfig ────────────────────────────────────────────────────────────

/// A single assistant invocation: what to ask and how to launch it.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub prompt: String,
    pub opts: InvokeOptions,
}

impl RunConfig {
    pub fn new(prompt: impl Into<String>, opts: InvokeOptions) -> Self {
        Self {
            prompt: prompt.into(),
            opts,
        }
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Drive one assistant invocation to completion.
///
/// Every output line is handed to `on_chunk` as soon as it is read, then
/// retained (up to `opts.capture_limit` bytes per pipe) for the returned
/// [`RunResult`]. When `opts.timeout` elapses first, the process is killed
/// and the result carries [`TIMEOUT_EXIT_CODE`] with `timed_out = true`.
///
/// Returns `Err` only when the process cannot be spawned or waited on; a
/// non-zero exit is a normal [`RunResult`].
pub async fn run<F>(config: RunConfig, on_chunk: F) -> Result<RunResult>
where
    F: FnMut(&OutputChunk),
{
    let RunConfig { prompt, opts } = config;
    tracing::debug!(
        executable = %opts.executable.display(),
        cwd = ?opts.cwd,
        prompt_len = prompt.len(),
        "starting amp"
    );
    let (process, stream) = AmpProcess::spawn(&prompt, &opts)?;
    drive(process, stream, opts.timeout, opts.capture_limit, on_chunk).await
}

/// Confirm the assistant is installed and answers a trivial prompt.
///
/// Resolves `executable` through `PATH`, then requires exit code 0 and
/// non-empty stdout within `timeout`.
pub async fn probe(executable: &Path, timeout: Duration) -> Result<RunResult> {
    let resolved = which::which(executable).map_err(|e| AmpAgentError::NotFound {
        executable: executable.to_path_buf(),
        detail: e.to_string(),
    })?;

    let opts = InvokeOptions {
        executable: resolved,
        timeout: Some(timeout),
        ..Default::default()
    };
    let result = run(RunConfig::new(PROBE_PROMPT, opts), |_| {}).await?;

    if result.timed_out {
        return Err(AmpAgentError::Process(format!(
            "no answer within {}s",
            timeout.as_secs()
        )));
    }
    if result.exit_code != 0 || result.stdout.trim().is_empty() {
        let stderr: String = result.stderr.chars().take(200).collect();
        return Err(AmpAgentError::Process(format!(
            "probe exited with code {} and {} bytes of output; stderr: {stderr}",
            result.exit_code,
            result.stdout.len()
        )));
    }
    Ok(result)
}

// ─── Internal ─────────────────────────────────────────────────────────────

/// Consume `stream` until EOF or cancellation, then reap the process.
///
/// Exposed as `pub(crate)` so tests can drive arbitrary `sh` commands.
pub(crate) async fn drive<F>(
    mut process: AmpProcess,
    mut stream: OutputStream,
    timeout: Option<Duration>,
    capture_limit: usize,
    mut on_chunk: F,
) -> Result<RunResult>
where
    F: FnMut(&OutputChunk),
{
    let started = Instant::now();
    let token = CancellationToken::new();
    let timer = timeout.map(|limit| {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            token.cancel();
        })
    });

    let mut stdout = CaptureBuffer::new(capture_limit);
    let mut stderr = CaptureBuffer::new(capture_limit);

    let mut timed_out = false;
    loop {
        tokio::select! {
            chunk = stream.next() => match chunk {
                Some(chunk) => {
                    on_chunk(&chunk);
                    match &chunk {
                        OutputChunk::Stdout(line) => stdout.push_line(line),
                        OutputChunk::Stderr(line) => stderr.push_line(line),
                    }
                }
                None => break,
            },
            _ = token.cancelled() => {
                timed_out = true;
                break;
            }
        }
    }

    // Both pipes are closed (or we gave up on them); the process may still
    // be running if it closed its output early.
    let exit_code = if timed_out {
        None
    } else {
        tokio::select! {
            code = process.wait() => Some(code?),
            _ = token.cancelled() => None,
        }
    };

    let exit_code = match exit_code {
        Some(code) => code,
        None => {
            timed_out = true;
            tracing::warn!(
                timeout_ms = timeout.map(|t| t.as_millis() as u64),
                "amp exceeded its timeout; killing"
            );
            process.kill().await;
            TIMEOUT_EXIT_CODE
        }
    };

    if let Some(timer) = timer {
        timer.abort();
    }

    if stdout.truncated() || stderr.truncated() {
        tracing::debug!(capture_limit, "amp output exceeded the capture limit; kept the tail");
    }

    Ok(RunResult {
        exit_code,
        stdout: stdout.into_string(),
        stderr: stderr.into_string(),
        timed_out,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────
