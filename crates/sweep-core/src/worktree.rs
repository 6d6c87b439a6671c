use crate::error::{Result, SweepError};
use crate::finding::Finding;
use crate::git::Git;
use crate::paths;
use crate::progress::{ProgressEvent, ProgressHandle, ProgressTracker};
use crate::repo::RepoInfo;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// An isolated checkout owned by one in-flight finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    pub path: PathBuf,
    /// Clone the worktree was added to; needed again for removal.
    pub repo_path: PathBuf,
    pub branch: String,
    pub branch_created: bool,
}

pub struct WorktreeManager {
    git: Git,
    worktree_dir: PathBuf,
    /// Worktrees handed out and not yet released. Never swept as stale.
    live: Mutex<HashSet<PathBuf>>,
}

impl WorktreeManager {
    pub fn new(git: Git, worktree_dir: impl Into<PathBuf>) -> Self {
        Self {
            git,
            worktree_dir: worktree_dir.into(),
            live: Mutex::new(HashSet::new()),
        }
    }

    fn live(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_live(&self, path: &Path) -> bool {
        self.live().contains(path)
    }

    /// Create a fresh worktree for `finding` at the path derived from
    /// `thread_id` and check out `fix/sonar-<key>` inside it.
    ///
    /// Leftover worktrees from earlier attempts on the same finding are
    /// removed first. A failed branch checkout is recorded and tolerated;
    /// only a failed `worktree add` is an error.
    pub async fn acquire(
        &self,
        repo: &RepoInfo,
        finding: &Finding,
        thread_id: &str,
        progress: &ProgressTracker,
        handle: &ProgressHandle,
    ) -> Result<Worktree> {
        let path = paths::worktree_path(&self.worktree_dir, thread_id);

        progress.append_event(
            handle,
            ProgressEvent::WorktreeCleanup,
            "Cleaning up any existing worktree",
        );
        let removed = self.cleanup_stale(repo, finding, &path).await;
        if removed > 0 {
            tracing::info!(finding = %finding.key, removed, "removed stale worktrees");
        }

        progress.append_event(
            handle,
            ProgressEvent::WorktreeCreate,
            &format!("Creating git worktree at {}", path.display()),
        );
        crate::io::ensure_dir(&self.worktree_dir)?;
        self.live().insert(path.clone());
        if let Err(e) = self.git.worktree_add(&repo.local_path, &path).await {
            self.live().remove(&path);
            return Err(SweepError::Worktree(format!(
                "failed to create worktree at {} from {}: {e}",
                path.display(),
                repo.local_path.display()
            )));
        }
        tracing::info!(thread = %thread_id, path = %path.display(), "worktree created");

        let branch = finding.branch_name();
        progress.append_event(
            handle,
            ProgressEvent::BranchCreate,
            &format!("Creating new branch: {branch}"),
        );
        let branch_created = match self.git.checkout_new_branch(&path, &branch).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    thread = %thread_id,
                    branch = %branch,
                    error = %e,
                    "branch creation failed"
                );
                progress.append_event(
                    handle,
                    ProgressEvent::BranchCreate,
                    &format!("Branch creation failed: {e}"),
                );
                false
            }
        };

        Ok(Worktree {
            path,
            repo_path: repo.local_path.clone(),
            branch,
            branch_created,
        })
    }

    /// Force-remove `target` and every worktree directory left by previous
    /// attempts on `finding`, then prune git's worktree list. Worktrees this
    /// manager currently hands out are never touched. Returns how many
    /// directories were found.
    pub async fn cleanup_stale(&self, repo: &RepoInfo, finding: &Finding, target: &Path) -> usize {
        let mut candidates = vec![target.to_path_buf()];
        if let Ok(entries) = std::fs::read_dir(&self.worktree_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let name = entry.file_name();
                if path != target
                    && paths::is_worktree_of(&name.to_string_lossy(), &repo.name, &finding.key)
                    && !self.is_live(&path)
                {
                    candidates.push(path);
                }
            }
        }

        let mut removed = 0;
        for path in candidates {
            let present = path.exists();
            if let Err(e) = self.git.worktree_remove(&repo.local_path, &path).await {
                if present {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "git could not remove stale worktree"
                    );
                }
            }
            if path.exists() {
                if let Err(e) = std::fs::remove_dir_all(&path) {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to delete stale worktree"
                    );
                }
            }
            if present {
                removed += 1;
            }
        }

        if let Err(e) = self.git.worktree_prune(&repo.local_path).await {
            tracing::debug!(repo = %repo.name, error = %e, "worktree prune failed");
        }
        removed
    }

    /// Force-remove `worktree`. Failures are logged and reported as `false`.
    pub async fn release(&self, worktree: &Worktree) -> bool {
        self.live().remove(&worktree.path);
        match self
            .git
            .worktree_remove(&worktree.repo_path, &worktree.path)
            .await
        {
            Ok(()) => {
                tracing::info!(path = %worktree.path.display(), "worktree removed");
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %worktree.path.display(),
                    error = %e,
                    "failed to remove worktree"
                );
                false
            }
        }
    }
}
