use crate::classify;
use crate::error::{Result, SweepError};
use crate::progress::{ProgressEvent, ProgressHandle, ProgressStatus, ProgressTracker};
use crate::worktree::{Worktree, WorktreeManager};
use amp_agent::{InvokeOptions, OutputChunk, RunConfig, RunResult, SPAWN_FAILURE_EXIT_CODE};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Characters of output kept in a terminal progress event.
const OUTPUT_SUMMARY_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub prompt: String,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// Something that can run a prompt and stream its output. The production
/// implementation is [`AmpAssistant`].
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn run(
        &self,
        request: AssistantRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c OutputChunk) + Send),
    ) -> Result<RunResult>;
}

pub struct AmpAssistant {
    executable: PathBuf,
    capture_limit: usize,
}

impl AmpAssistant {
    pub fn new(executable: impl Into<PathBuf>, capture_limit: usize) -> Self {
        Self {
            executable: executable.into(),
            capture_limit,
        }
    }
}

#[async_trait]
impl Assistant for AmpAssistant {
    async fn run(
        &self,
        request: AssistantRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c OutputChunk) + Send),
    ) -> Result<RunResult> {
        let opts = InvokeOptions {
            executable: self.executable.clone(),
            cwd: request.cwd,
            timeout: request.timeout,
            capture_limit: self.capture_limit,
            ..Default::default()
        };
        amp_agent::run(RunConfig::new(request.prompt, opts), |chunk| on_chunk(chunk))
            .await
            .map_err(|e| SweepError::AssistantUnavailable(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// AssistantInvoker
// ---------------------------------------------------------------------------

/// Result of one fix attempt inside a worktree.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub result: RunResult,
    pub status: ProgressStatus,
    pub worktree_removed: bool,
}

impl Invocation {
    pub fn blocked(&self) -> bool {
        self.status == ProgressStatus::Blocked
    }
}

/// Runs the assistant inside a worktree, streaming its output into the
/// progress record (and optionally the console), and always releases the
/// worktree afterwards.
pub struct AssistantInvoker {
    assistant: Arc<dyn Assistant>,
    timeout: Duration,
    mirror_output: bool,
}

impl AssistantInvoker {
    pub fn new(assistant: Arc<dyn Assistant>, timeout: Duration, mirror_output: bool) -> Self {
        Self {
            assistant,
            timeout,
            mirror_output,
        }
    }

    pub async fn invoke(
        &self,
        worktree: &Worktree,
        worktrees: &WorktreeManager,
        prompt: &str,
        progress: &ProgressTracker,
        handle: &ProgressHandle,
    ) -> Invocation {
        let key = handle.key().to_string();
        progress.append_event(
            handle,
            ProgressEvent::AmpStart,
            &format!(
                "Starting Amp CLI analysis and fix\nBranch: {}\nPrompt length: {} characters",
                worktree.branch,
                prompt.len()
            ),
        );
        tracing::info!(
            finding = %key,
            worktree = %worktree.path.display(),
            timeout_ms = self.timeout.as_millis() as u64,
            "starting assistant"
        );

        let mirror = self.mirror_output;
        let mut on_chunk = |chunk: &OutputChunk| {
            match chunk {
                OutputChunk::Stdout(line) => {
                    if mirror {
                        println!("[{key}] {line}");
                    }
                    progress.append_event(
                        handle,
                        ProgressEvent::AmpOutput,
                        &format!("STDOUT: {line}"),
                    );
                }
                OutputChunk::Stderr(line) => {
                    if mirror {
                        eprintln!("[{key}] {line}");
                    }
                    progress.append_event(
                        handle,
                        ProgressEvent::AmpError,
                        &format!("STDERR: {line}"),
                    );
                }
            }
        };

        let request = AssistantRequest {
            prompt: prompt.to_string(),
            cwd: Some(worktree.path.clone()),
            timeout: Some(self.timeout),
        };
        let (result, spawned) = match self.assistant.run(request, &mut on_chunk).await {
            Ok(result) => (result, true),
            Err(e) => {
                tracing::error!(finding = %key, error = %e, "assistant could not be started");
                let result = RunResult {
                    exit_code: SPAWN_FAILURE_EXIT_CODE,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    timed_out: false,
                    duration_ms: 0,
                };
                (result, false)
            }
        };
        tracing::info!(
            finding = %key,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            duration_ms = result.duration_ms,
            "assistant finished"
        );

        progress.append_event(
            handle,
            ProgressEvent::WorktreeRemove,
            &format!("Removing worktree {}", worktree.path.display()),
        );
        let worktree_removed = worktrees.release(worktree).await;
        if !worktree_removed {
            progress.append_event(
                handle,
                ProgressEvent::WorktreeRemove,
                "Worktree removal failed; left for the next run's cleanup",
            );
        }

        // A process that never started has no output worth classifying.
        let status = if spawned {
            classify::classify(result.exit_code, &result.stdout, &result.stderr)
        } else {
            ProgressStatus::Failed
        };
        Invocation {
            result,
            status,
            worktree_removed,
        }
    }
}

/// Body of the terminal progress event.
pub fn terminal_summary(status: ProgressStatus, result: &RunResult) -> String {
    let mut text = format!(
        "Amp thread {}\nExit code: {}\nSTDOUT length: {} characters\nSTDERR length: {} characters\n",
        status.as_str().to_lowercase(),
        result.exit_code,
        result.stdout.chars().count(),
        result.stderr.chars().count(),
    );
    if result.timed_out {
        text.push_str("Timed out: assistant was killed\n");
    }
    text.push_str("\nFinal output summary:\n");
    text.push_str(&tail_or(&result.stdout, "No stdout output"));
    if status != ProgressStatus::Completed {
        text.push_str("\n\nError output:\n");
        text.push_str(&tail_or(&result.stderr, "No stderr output"));
    }
    text
}

fn tail_or(text: &str, empty: &str) -> String {
    let count = text.chars().count();
    if count == 0 {
        return empty.to_string();
    }
    text.chars()
        .skip(count.saturating_sub(OUTPUT_SUMMARY_CHARS))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
