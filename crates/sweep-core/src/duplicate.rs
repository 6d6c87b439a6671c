use crate::finding::Finding;
use crate::git::{Gh, Git};
use crate::repo::RepoInfo;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCheck {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl DuplicateCheck {
    fn clear() -> Self {
        Self {
            exists: false,
            details: None,
        }
    }

    fn found(details: String) -> Self {
        Self {
            exists: true,
            details: Some(details),
        }
    }
}

/// Looks for an earlier fix attempt before any worktree is created: first a
/// remote `fix/sonar-<key>*` branch, then (when `gh` is configured) an open
/// pull request titled after the finding.
pub struct DuplicateDetector {
    git: Git,
    gh: Option<Gh>,
}

impl DuplicateDetector {
    pub fn new(git: Git, gh: Option<Gh>) -> Self {
        Self { git, gh }
    }

    /// Never fails: tool errors degrade to "no duplicate".
    pub async fn check(&self, repo: &RepoInfo, finding: &Finding) -> DuplicateCheck {
        match self
            .git
            .remote_branches(&repo.local_path, &finding.remote_branch_pattern())
            .await
        {
            Ok(branches) if !branches.is_empty() => {
                tracing::info!(
                    finding = %finding.key,
                    branches = %branches.join(", "),
                    "found existing remote fix branch"
                );
                return DuplicateCheck::found(format!(
                    "Found existing PR branches: {}",
                    branches.join(", ")
                ));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    finding = %finding.key,
                    error = %e,
                    "could not list remote branches"
                );
            }
        }

        if let Some(gh) = &self.gh {
            match gh.pr_list(&repo.local_path, &finding.pr_search()).await {
                Ok(prs) if !prs.is_empty() => {
                    let urls: Vec<&str> = prs.iter().map(|pr| pr.url.as_str()).collect();
                    tracing::info!(
                        finding = %finding.key,
                        prs = %urls.join(", "),
                        "found existing pull request"
                    );
                    return DuplicateCheck::found(format!(
                        "Found {} existing PR(s): {}",
                        prs.len(),
                        urls.join(", ")
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        finding = %finding.key,
                        error = %e,
                        "could not check for existing pull requests"
                    );
                }
            }
        }

        tracing::debug!(finding = %finding.key, "no existing fix found");
        DuplicateCheck::clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use crate::git::testing::*;
    use std::io;
    use std::path::PathBuf;

    fn finding() -> Finding {
        Finding {
            key: "X1".to_string(),
            rule: "r".to_string(),
            severity: Severity::Minor,
            message: "m".to_string(),
            component: "c".to_string(),
            line: None,
            project: "org_repo".to_string(),
            repository: "org/repo".to_string(),
            issue_type: None,
            status: None,
        }
    }

    fn repo() -> RepoInfo {
        RepoInfo {
            name: "org/repo".to_string(),
            local_path: PathBuf::from("/repos/org-repo"),
            clone_url: "https://github.com/org/repo.git".to_string(),
            exists: true,
        }
    }

    #[tokio::test]
    async fn remote_branch_means_duplicate() {
        let runner = ScriptedRunner::new(|program, _| {
            assert_eq!(program, "git");
            Ok(ok_output("  origin/fix/sonar-X1\n"))
        });
        let detector = DuplicateDetector::new(
            Git::new(runner.clone(), "git"),
            Some(Gh::new(runner.clone(), "gh")),
        );
        let check = detector.check(&repo(), &finding()).await;
        assert!(check.exists);
        assert_eq!(
            check.details.as_deref(),
            Some("Found existing PR branches: origin/fix/sonar-X1")
        );
        assert!(runner.called_with("origin/fix/sonar-X1*"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn pull_request_means_duplicate() {
        let runner = ScriptedRunner::new(|program, _| {
            if program == "gh" {
                Ok(ok_output(
                    r#"[{"title":"Fix SonarQube issue X1: m","url":"https://example.test/pull/9","state":"OPEN"}]"#,
                ))
            } else {
                Ok(ok_output(""))
            }
        });
        let detector =
            DuplicateDetector::new(Git::new(runner.clone(), "git"), Some(Gh::new(runner, "gh")));
        let check = detector.check(&repo(), &finding()).await;
        assert!(check.exists);
        assert!(check.details.unwrap().contains("https://example.test/pull/9"));
    }

    #[tokio::test]
    async fn missing_gh_degrades_to_branch_only() {
        let runner = ScriptedRunner::new(|program, _| {
            if program == "gh" {
                Err(io::Error::new(io::ErrorKind::NotFound, "gh: not found"))
            } else {
                Ok(ok_output(""))
            }
        });
        let detector =
            DuplicateDetector::new(Git::new(runner.clone(), "git"), Some(Gh::new(runner, "gh")));
        let check = detector.check(&repo(), &finding()).await;
        assert!(!check.exists);
        assert!(check.details.is_none());
    }

    #[tokio::test]
    async fn pr_check_can_be_disabled() {
        let runner = ScriptedRunner::ok();
        let detector = DuplicateDetector::new(Git::new(runner.clone(), "git"), None);
        assert!(!detector.check(&repo(), &finding()).await.exists);
        assert!(runner.calls().iter().all(|(program, _)| program == "git"));
    }
}
