//! File-backed progress records, one Markdown document per finding.
//!
//! A record starts life as `<output>/<project>/started-<key>.md`, collects a
//! timestamped event log while the finding is processed, and is renamed
//! exactly once to a name carrying its terminal outcome
//! (`fixed-`, `skipped-`, `failed-`, `blocked-`, or `unknown-`).
//!
//! Event appends and status rewrites are telemetry: failures are logged and
//! never surface to the caller.

use crate::error::Result;
use crate::finding::Finding;
use crate::{io, paths};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const STATUS_START: &str = "<!-- sweep:status -->";
const STATUS_END: &str = "<!-- /sweep:status -->";

// ---------------------------------------------------------------------------
// ProgressStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    Skipped,
    Blocked,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Started => "STARTED",
            ProgressStatus::InProgress => "IN_PROGRESS",
            ProgressStatus::Completed => "COMPLETED",
            ProgressStatus::Failed => "FAILED",
            ProgressStatus::Skipped => "SKIPPED",
            ProgressStatus::Blocked => "BLOCKED",
        }
    }

    /// File-name prefix of a finalized record.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ProgressStatus::Completed => "fixed",
            ProgressStatus::Skipped => "skipped",
            ProgressStatus::Failed => "failed",
            ProgressStatus::Blocked => "blocked",
            ProgressStatus::Started | ProgressStatus::InProgress => "unknown",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProgressStatus::Completed
                | ProgressStatus::Failed
                | ProgressStatus::Skipped
                | ProgressStatus::Blocked
        )
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressEvent {
    ThreadStarted,
    RepoSync,
    Skipped,
    WorktreeCleanup,
    WorktreeCreate,
    BranchCreate,
    AmpStart,
    AmpOutput,
    AmpError,
    WorktreeRemove,
    Completed,
    Failed,
    Blocked,
}

impl ProgressEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressEvent::ThreadStarted => "THREAD_STARTED",
            ProgressEvent::RepoSync => "REPO_SYNC",
            ProgressEvent::Skipped => "SKIPPED",
            ProgressEvent::WorktreeCleanup => "WORKTREE_CLEANUP",
            ProgressEvent::WorktreeCreate => "WORKTREE_CREATE",
            ProgressEvent::BranchCreate => "BRANCH_CREATE",
            ProgressEvent::AmpStart => "AMP_START",
            ProgressEvent::AmpOutput => "AMP_OUTPUT",
            ProgressEvent::AmpError => "AMP_ERROR",
            ProgressEvent::WorktreeRemove => "WORKTREE_REMOVE",
            ProgressEvent::Completed => "COMPLETED",
            ProgressEvent::Failed => "FAILED",
            ProgressEvent::Blocked => "BLOCKED",
        }
    }

    /// Log event matching a terminal status.
    pub fn for_status(status: ProgressStatus) -> Option<Self> {
        match status {
            ProgressStatus::Completed => Some(ProgressEvent::Completed),
            ProgressStatus::Failed => Some(ProgressEvent::Failed),
            ProgressStatus::Skipped => Some(ProgressEvent::Skipped),
            ProgressStatus::Blocked => Some(ProgressEvent::Blocked),
            ProgressStatus::Started | ProgressStatus::InProgress => None,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StatusRecord
// ---------------------------------------------------------------------------

/// The `## Status` section body. Rendered whole on every change so the
/// section is never patched piecemeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: ProgressStatus,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn now(status: ProgressStatus) -> Self {
        Self {
            status,
            updated_at: Utc::now(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{STATUS_START}\n**{}** - {}\n{STATUS_END}",
            self.status,
            timestamp(self.updated_at)
        )
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// ProgressHandle
// ---------------------------------------------------------------------------

/// Binding to one finding's record. Not `Clone`: [`ProgressTracker::finalize`]
/// consumes it, so a record cannot be renamed twice through the same handle.
#[derive(Debug)]
pub struct ProgressHandle {
    path: PathBuf,
    project: String,
    key: String,
    status: ProgressStatus,
    finalized: bool,
}

impl ProgressHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn status(&self) -> ProgressStatus {
        self.status
    }
}

// ---------------------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    output_dir: PathBuf,
}

impl ProgressTracker {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        paths::project_output_dir(&self.output_dir, project)
    }

    /// Remove every artifact of `project` from a previous run.
    pub fn clear_project(&self, project: &str) -> Result<()> {
        let dir = self.project_dir(project);
        if io::remove_dir_if_exists(&dir)? {
            tracing::info!(project, path = %dir.display(), "cleared previous project output");
        }
        Ok(())
    }

    /// Write the initial `started-<key>.md` document.
    pub fn create(&self, finding: &Finding) -> Result<ProgressHandle> {
        let path =
            paths::progress_file(&self.output_dir, &finding.project, "started", &finding.key);
        let record = StatusRecord::now(ProgressStatus::Started);
        let doc = initial_document(finding, &record);
        io::atomic_write(&path, doc.as_bytes())?;
        tracing::debug!(finding = %finding.key, path = %path.display(), "created progress record");
        Ok(ProgressHandle {
            path,
            project: finding.project.clone(),
            key: finding.key.clone(),
            status: ProgressStatus::Started,
            finalized: false,
        })
    }

    /// Append a timestamped log entry. Never fails the caller.
    pub fn append_event(&self, handle: &ProgressHandle, event: ProgressEvent, detail: &str) {
        let mut entry = format!("\n### {} - {}\n", timestamp(Utc::now()), event);
        if !detail.is_empty() {
            entry.push_str(detail);
            if !detail.ends_with('\n') {
                entry.push('\n');
            }
        }
        if let Err(e) = io::append_text(&handle.path, &entry) {
            tracing::warn!(
                finding = %handle.key,
                event = %event,
                error = %e,
                "failed to append progress event"
            );
        }
    }

    /// Rewrite the `## Status` section. Never fails the caller.
    pub fn set_status(&self, handle: &mut ProgressHandle, status: ProgressStatus) {
        handle.status = status;
        let record = StatusRecord::now(status);
        match io::replace_between_markers(&handle.path, STATUS_START, STATUS_END, &record.render())
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                finding = %handle.key,
                path = %handle.path.display(),
                "progress record has no status section"
            ),
            Err(e) => tracing::warn!(
                finding = %handle.key,
                error = %e,
                "failed to update progress status"
            ),
        }
    }

    /// Record the terminal `status` and rename the document to
    /// `<prefix>-<key>.md`.
    ///
    /// Returns the handle bound to the new location, or the original handle
    /// when the rename fails. A handle that was already finalized is returned
    /// untouched.
    pub fn finalize(&self, mut handle: ProgressHandle, status: ProgressStatus) -> ProgressHandle {
        if handle.finalized {
            tracing::warn!(
                finding = %handle.key,
                status = %handle.status,
                "progress record already finalized; ignoring"
            );
            return handle;
        }

        if !status.is_terminal() {
            tracing::warn!(
                finding = %handle.key,
                status = %status,
                "finalizing with a non-terminal status"
            );
        }
        self.set_status(&mut handle, status);
        let target = paths::progress_file(
            &self.output_dir,
            &handle.project,
            status.file_prefix(),
            &handle.key,
        );
        if target == handle.path {
            handle.finalized = true;
            return handle;
        }

        match std::fs::rename(&handle.path, &target) {
            Ok(()) => {
                tracing::info!(
                    finding = %handle.key,
                    status = %status,
                    path = %target.display(),
                    "finalized progress record"
                );
                handle.path = target;
                handle.finalized = true;
                handle
            }
            Err(e) => {
                tracing::warn!(
                    finding = %handle.key,
                    error = %e,
                    "failed to rename progress record; keeping original"
                );
                handle
            }
        }
    }
}

fn initial_document(finding: &Finding, record: &StatusRecord) -> String {
    let line = finding
        .line
        .map(|l| l.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        "# SonarQube Issue Fix Progress\n\
         \n\
         ## Issue Details\n\
         - **Issue Key**: {key}\n\
         - **Repository**: {repo}\n\
         - **Rule**: {rule}\n\
         - **Severity**: {severity}\n\
         - **Type**: {kind}\n\
         - **Message**: {message}\n\
         - **Component**: {component}\n\
         - **Line**: {line}\n\
         - **Created**: {created}\n\
         \n\
         ## Status\n\
         {status}\n\
         \n\
         ## Progress Log\n",
        key = finding.key,
        repo = if finding.repository.is_empty() {
            "Unknown"
        } else {
            finding.repository.as_str()
        },
        rule = finding.rule,
        severity = finding.severity,
        kind = finding.issue_type.as_deref().unwrap_or("Unknown"),
        message = finding.message,
        component = finding.component,
        created = timestamp(record.updated_at),
        status = record.render(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
