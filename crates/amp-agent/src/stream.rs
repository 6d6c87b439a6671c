use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::types::OutputChunk;

// ─── OutputStream ─────────────────────────────────────────────────────────

/// An async stream of [`OutputChunk`]s from an assistant subprocess.
///
/// Backed by a bounded Tokio mpsc channel fed by one reader task per pipe.
/// The stream ends once both pipes reach EOF. Dropping it closes the
/// receiver, which makes the reader tasks exit on their next send.
pub struct OutputStream {
    rx: mpsc::Receiver<OutputChunk>,
}

impl OutputStream {
    pub(crate) fn from_channel(rx: mpsc::Receiver<OutputChunk>) -> Self {
        Self { rx }
    }
}

impl Stream for OutputStream {
    type Item = OutputChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::AmpProcess;
    use futures::StreamExt;
    use tokio::process::Command;

    /// The process is returned too: dropping it kills the child.
    fn sh(script: &str) -> (AmpProcess, OutputStream) {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        AmpProcess::spawn_command(cmd).unwrap()
    }

    #[tokio::test]
    async fn stream_yields_lines_in_order() {
        let (_process, stream) = sh("echo one; echo two; echo three");
        let chunks: Vec<_> = stream.collect().await;
        let lines: Vec<_> = chunks.iter().map(|c| c.text()).collect();
        assert_eq!(lines, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn stream_tags_stderr_separately() {
        let (_process, stream) = sh("echo out; echo err 1>&2");
        let chunks: Vec<_> = stream.collect().await;
        assert!(chunks.contains(&OutputChunk::Stdout("out".into())));
        assert!(chunks.contains(&OutputChunk::Stderr("err".into())));
    }

    #[tokio::test]
    async fn stream_keeps_final_line_without_newline() {
        let (_process, stream) = sh("printf 'no newline'");
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks, [OutputChunk::Stdout("no newline".into())]);
    }

    #[tokio::test]
    async fn stream_ends_when_process_produces_nothing() {
        let (_process, stream) = sh("true");
        let chunks: Vec<_> = stream.collect().await;
        assert!(chunks.is_empty());
    }
}
