use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Binary name used when no explicit executable is configured.
pub const DEFAULT_EXECUTABLE: &str = "amp";

/// Exit code reported when the process was killed for exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code callers should report when the process could not be spawned.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 1;

/// Upper bound on the bytes retained per stream (stdout and stderr each).
pub const DEFAULT_CAPTURE_LIMIT: usize = 4 * 1024 * 1024;

// ─── InvokeOptions ────────────────────────────────────────────────────────

/// How to launch one `amp -x <prompt>` invocation.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    /// Program to run (default: `amp`, resolved through `PATH`).
    pub executable: PathBuf,
    /// Working directory for the subprocess. Inherits ours when `None`.
    pub cwd: Option<PathBuf>,
    /// Kill the process if it has not exited after this long.
    pub timeout: Option<Duration>,
    /// Extra environment variables for the subprocess.
    pub env: Vec<(String, String)>,
    /// Bytes of stdout/stderr retained in the [`RunResult`]; older output is
    /// dropped first.
    pub capture_limit: usize,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            cwd: None,
            timeout: None,
            env: Vec::new(),
            capture_limit: DEFAULT_CAPTURE_LIMIT,
        }
    }
}

// ─── OutputChunk ──────────────────────────────────────────────────────────

/// One line of output, tagged with the pipe it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stream", content = "text", rename_all = "snake_case")]
pub enum OutputChunk {
    Stdout(String),
    Stderr(String),
}

impl OutputChunk {
    pub fn text(&self) -> &str {
        match self {
            OutputChunk::Stdout(line) | OutputChunk::Stderr(line) => line,
        }
    }
}

// ─── RunResult ────────────────────────────────────────────────────────────

/// Terminal result of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Process exit code; [`TIMEOUT_EXIT_CODE`] when killed on timeout and
    /// `128 + signal` when terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

// ─── CaptureBuffer ────────────────────────────────────────────────────────

/// Accumulates streamed lines, keeping only the most recent `limit` bytes.
/// Whole lines are dropped from the front; only a single line longer than
/// `limit` is cut.
#[derive(Debug)]
pub(crate) struct CaptureBuffer {
    lines: VecDeque<String>,
    /// Bytes held in `lines`, counting one newline per line.
    bytes: usize,
    limit: usize,
    truncated: bool,
}

impl CaptureBuffer {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            limit,
            truncated: false,
        }
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        let mut line = format!("{line}\n");
        if line.len() > self.limit {
            let mut cut = line.len() - self.limit;
            while !line.is_char_boundary(cut) {
                cut += 1;
            }
            line.drain(..cut);
            self.truncated = true;
        }
        self.bytes += line.len();
        self.lines.push_back(line);
        while self.bytes > self.limit {
            match self.lines.pop_front() {
                Some(dropped) => self.bytes -= dropped.len(),
                None => break,
            }
            self.truncated = true;
        }
    }

    pub(crate) fn truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn into_string(self) -> String {
        self.lines.into_iter().collect()
    }
}
