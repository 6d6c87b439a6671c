//! `amp-agent`: async driver for the `amp` CLI subprocess.
//!
//! The assistant is a black box invoked as `amp -x "<prompt>"`. This crate
//! owns everything about that invocation: spawning it in a working directory,
//! streaming stdout/stderr line by line as they arrive, keeping a bounded
//! copy of the output, and killing the process when it outlives its timeout.
//!
//! # Architecture
//!
//! ```text
//! InvokeOptions + prompt
//!     │
//!     ▼
//! AmpProcess      ← spawns `amp -x <prompt>`, one reader task per pipe
//!     │
//!     ▼
//! OutputStream    ← implements futures::Stream<Item = OutputChunk>
//!     │              bounded mpsc channel fed by the reader tasks
//!     ▼
//! runner::run     ← races the stream against a CancellationToken that a
//!                    timer cancels at the timeout; returns a RunResult
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use amp_agent::{runner, InvokeOptions, OutputChunk, RunConfig};
//! use std::time::Duration;
//!
//! let opts = InvokeOptions {
//!     cwd: Some("/tmp/worktree".into()),
//!     timeout: Some(Duration::from_secs(300)),
//!     ..Default::default()
//! };
//! let result = runner::run(RunConfig::new("fix the lint warning", opts), |chunk| {
//!     if let OutputChunk::Stdout(line) = chunk {
//!         println!("{line}");
//!     }
//! })
//! .await?;
//! assert!(!result.timed_out);
//! ```

pub mod error;
pub mod runner;
pub mod stream;
pub mod types;

pub(crate) mod process;


pub use error::AmpAgentError;
pub use runner::{probe, run, RunConfig};
pub use stream::OutputStream;
pub use types::{
    InvokeOptions, OutputChunk, RunResult, DEFAULT_CAPTURE_LIMIT, DEFAULT_EXECUTABLE,
    SPAWN_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AmpAgentError>;

/// Run a single prompt to completion without observing intermediate output.
///
/// Equivalent to [`runner::run`] with a no-op chunk callback.
pub async fn invoke(prompt: impl Into<String>, opts: InvokeOptions) -> Result<RunResult> {
    runner::run(RunConfig::new(prompt, opts), |_| {}).await
}
