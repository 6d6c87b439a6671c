use crate::error::{Result, SweepError};
use crate::git::Git;
use crate::paths;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Where a repository lives locally and where it was cloned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoInfo {
    /// `org/name`
    pub name: String,
    pub local_path: PathBuf,
    pub clone_url: String,
    pub exists: bool,
}

/// Run-scoped cache of local clones.
///
/// The first reference to a repository clones it (or refreshes an existing
/// clone); later references refresh it again. Syncs for the same repository
/// are serialized so concurrent findings never race on one clone.
pub struct RepoCache {
    git: Git,
    repos_dir: PathBuf,
    base_branch: String,
    clone_url_template: String,
    entries: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Option<RepoInfo>>>>>,
}

impl RepoCache {
    pub fn new(
        git: Git,
        repos_dir: impl Into<PathBuf>,
        base_branch: impl Into<String>,
        clone_url_template: impl Into<String>,
    ) -> Self {
        Self {
            git,
            repos_dir: repos_dir.into(),
            base_branch: base_branch.into(),
            clone_url_template: clone_url_template.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn describe(&self, repository: &str) -> RepoInfo {
        let local_path = paths::repo_clone_dir(&self.repos_dir, repository);
        RepoInfo {
            name: repository.to_string(),
            exists: local_path.join(".git").exists(),
            local_path,
            clone_url: self.clone_url_template.replace("{repo}", repository),
        }
    }

    fn slot(&self, repository: &str) -> Arc<tokio::sync::Mutex<Option<RepoInfo>>> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .entry(repository.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// Make sure `repository` is cloned and current.
    ///
    /// Clone failure is an error; fetch or pull failure on an existing clone
    /// is only a warning since the stale checkout is still usable.
    pub async fn ensure(&self, repository: &str) -> Result<RepoInfo> {
        let slot = self.slot(repository);
        let mut cached = slot.lock().await;

        let mut info = match cached.as_ref() {
            Some(info) => info.clone(),
            None => self.describe(repository),
        };

        if info.exists {
            self.refresh(&info).await;
        } else {
            crate::io::ensure_dir(&self.repos_dir)?;
            tracing::info!(
                repo = %info.name,
                path = %info.local_path.display(),
                "repository not found locally; cloning"
            );
            self.git
                .clone_repo(&info.clone_url, &info.local_path)
                .await
                .map_err(|e| SweepError::Clone {
                    repo: info.name.clone(),
                    detail: e.to_string(),
                })?;
            info.exists = true;
            tracing::info!(repo = %info.name, "repository cloned");
        }

        *cached = Some(info.clone());
        Ok(info)
    }

    async fn refresh(&self, info: &RepoInfo) {
        if let Err(e) = self.git.fetch(&info.local_path).await {
            tracing::warn!(repo = %info.name, error = %e, "fetch failed; using local state");
        }
        match self.git.pull(&info.local_path, &self.base_branch).await {
            Ok(()) => tracing::debug!(repo = %info.name, "repository updated"),
            Err(e) => {
                tracing::warn!(repo = %info.name, error = %e, "pull failed; using local state")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::*;
    use std::io;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_clone_is_cloned_once_then_refreshed() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::ok();
        let cache = RepoCache::new(
            Git::new(runner.clone(), "git"),
            dir.path(),
            "main",
            "https://github.com/{repo}.git",
        );

        let info = cache.ensure("org/repo").await.unwrap();
        assert!(info.exists);
        assert_eq!(info.local_path, dir.path().join("org-repo"));
        assert_eq!(info.clone_url, "https://github.com/org/repo.git");

        cache.ensure("org/repo").await.unwrap();
        let calls = runner.calls();
        let clones = calls.iter().filter(|(_, a)| a[0] == "clone").count();
        assert_eq!(clones, 1);
        assert!(runner.called_with("pull"));
        assert!(runner.called_with("fetch"));
    }

    #[tokio::test]
    async fn existing_clone_is_pulled_not_cloned() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("org-repo/.git")).unwrap();
        let runner = ScriptedRunner::ok();
        let git = Git::new(runner.clone(), "git");
        let cache = RepoCache::new(git, dir.path(), "develop", "{repo}");
        cache.ensure("org/repo").await.unwrap();
        assert!(!runner.called_with("clone"));
        assert!(runner.called_with("develop"));
    }

    #[tokio::test]
    async fn clone_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(|_, _| Ok(failed_output(128, "repository not found")));
        let cache = RepoCache::new(Git::new(runner, "git"), dir.path(), "main", "{repo}");
        let err = cache.ensure("org/missing").await.unwrap_err();
        assert!(matches!(err, SweepError::Clone { .. }));
        assert!(err.to_string().contains("repository not found"));
    }

    #[tokio::test]
    async fn pull_failure_is_tolerated() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("org-repo/.git")).unwrap();
        let runner = ScriptedRunner::new(|_, args| {
            if args.iter().any(|a| a == "pull") {
                Err(io::Error::new(io::ErrorKind::Other, "network down"))
            } else {
                Ok(ok_output(""))
            }
        });
        let cache = RepoCache::new(Git::new(runner, "git"), dir.path(), "main", "{repo}");
        let info = cache.ensure("org/repo").await.unwrap();
        assert!(info.exists);
    }
}
