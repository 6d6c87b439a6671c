//! Batch coordinator: turns a list of findings into fix attempts.
//!
//! Findings are grouped by repository. Every repository gets its own
//! semaphore of `max_concurrent_per_repo` permits, and every finding is a
//! task on one [`JoinSet`] that holds its repository's permit for the whole
//! attempt. Repositories do not share permits, so at most
//! `repositories × max_concurrent_per_repo` attempts run at once.
//!
//! Per-finding failures are converted into [`FindingResult`]s and never abort
//! sibling findings. A task that panics is reported as [`FindingOutcome::Errored`].

use crate::config::Config;
use crate::duplicate::DuplicateDetector;
use crate::error::{Result, SweepError};
use crate::finding::Finding;
use crate::git::{CommandRunner, Gh, Git, ProcessCommandRunner};
use crate::invoker::{terminal_summary, AmpAssistant, Assistant, AssistantInvoker};
use crate::progress::{ProgressEvent, ProgressHandle, ProgressStatus, ProgressTracker};
use crate::repo::RepoCache;
use crate::worktree::WorktreeManager;
use crate::{paths, prompt};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingOutcome {
    Completed,
    Blocked,
    Failed,
    Skipped,
    /// The processing task itself crashed.
    Errored,
}

impl FindingOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingOutcome::Completed => "completed",
            FindingOutcome::Blocked => "blocked",
            FindingOutcome::Failed => "failed",
            FindingOutcome::Skipped => "skipped",
            FindingOutcome::Errored => "errored",
        }
    }

    fn from_status(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Completed => FindingOutcome::Completed,
            ProgressStatus::Blocked => FindingOutcome::Blocked,
            ProgressStatus::Skipped => FindingOutcome::Skipped,
            ProgressStatus::Failed | ProgressStatus::Started | ProgressStatus::InProgress => {
                FindingOutcome::Failed
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FindingResult {
    pub key: String,
    pub project: String,
    pub repository: String,
    pub thread_id: String,
    pub outcome: FindingOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Why the attempt did not complete. Skips carry `Skipped - <details>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Final location of the progress record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl FindingResult {
    fn new(finding: &Finding, thread_id: &str, outcome: FindingOutcome) -> Self {
        Self {
            key: finding.key.clone(),
            project: finding.project.clone(),
            repository: finding.repository.clone(),
            thread_id: thread_id.to_string(),
            outcome,
            exit_code: None,
            timed_out: false,
            error: None,
            artifact: None,
        }
    }

    /// A skipped finding counts as success: its fix already exists.
    pub fn success(&self) -> bool {
        matches!(
            self.outcome,
            FindingOutcome::Completed | FindingOutcome::Skipped
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub blocked: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub repositories: usize,
    pub results: Vec<FindingResult>,
}

impl RunSummary {
    pub fn from_results(mut results: Vec<FindingResult>, repositories: usize) -> Self {
        results.sort_by(|a, b| (&a.repository, &a.key).cmp(&(&b.repository, &b.key)));
        let count = |o: FindingOutcome| results.iter().filter(|r| r.outcome == o).count();
        Self {
            total: results.len(),
            succeeded: count(FindingOutcome::Completed),
            blocked: count(FindingOutcome::Blocked),
            failed: count(FindingOutcome::Failed),
            skipped: count(FindingOutcome::Skipped),
            errored: count(FindingOutcome::Errored),
            repositories,
            results,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(FindingResult::success)
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

struct Inner {
    repos: RepoCache,
    detector: DuplicateDetector,
    worktrees: WorktreeManager,
    invoker: AssistantInvoker,
    tracker: ProgressTracker,
    processed: AtomicUsize,
}

pub struct Coordinator {
    inner: Arc<Inner>,
    max_concurrent_per_repo: usize,
}

impl Coordinator {
    pub fn new(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        assistant: Arc<dyn Assistant>,
    ) -> Self {
        let git = Git::new(runner.clone(), config.git_bin.clone());
        let gh = config
            .check_pull_requests
            .then(|| Gh::new(runner, config.gh_bin.clone()));
        let inner = Inner {
            repos: RepoCache::new(
                git.clone(),
                config.repos_dir.clone(),
                config.base_branch.clone(),
                config.clone_url_template.clone(),
            ),
            detector: DuplicateDetector::new(git.clone(), gh),
            worktrees: WorktreeManager::new(git, config.worktree_dir.clone()),
            invoker: AssistantInvoker::new(
                assistant,
                config.assistant_timeout(),
                config.mirror_output,
            ),
            tracker: ProgressTracker::new(config.output_dir.clone()),
            processed: AtomicUsize::new(0),
        };
        Self {
            inner: Arc::new(inner),
            max_concurrent_per_repo: config.max_concurrent_per_repo,
        }
    }

    /// Production wiring: real `git`/`gh` processes and the `amp` assistant.
    pub fn from_config(config: &Config) -> Self {
        let assistant = AmpAssistant::new(config.assistant_bin.clone(), config.capture_limit_bytes);
        Self::new(config, Arc::new(ProcessCommandRunner), Arc::new(assistant))
    }

    /// Findings processed (started) so far in this coordinator's lifetime.
    pub fn processed(&self) -> usize {
        self.inner.processed.load(Ordering::Relaxed)
    }

    /// Process every finding and wait for all of them.
    ///
    /// Only an unusable concurrency limit is an error; everything that goes
    /// wrong for a single finding ends up in its [`FindingResult`].
    pub async fn run(&self, findings: Vec<Finding>) -> Result<RunSummary> {
        if self.max_concurrent_per_repo == 0 {
            return Err(SweepError::InvalidConfig(
                "max_concurrent_per_repo must be at least 1".to_string(),
            ));
        }
        let total = findings.len();
        if total == 0 {
            tracing::warn!("no findings to process");
            return Ok(RunSummary::default());
        }

        let projects: BTreeSet<&str> = findings.iter().map(|f| f.project.as_str()).collect();
        for project in projects {
            if let Err(e) = self.inner.tracker.clear_project(project) {
                tracing::warn!(project, error = %e, "failed to clear previous output");
            }
        }

        let mut results = Vec::with_capacity(total);
        let mut by_repo: BTreeMap<String, Vec<Finding>> = BTreeMap::new();
        for finding in findings {
            if finding.repository.trim().is_empty() {
                tracing::error!(finding = %finding.key, "finding has no repository");
                let mut result = FindingResult::new(&finding, "no-thread", FindingOutcome::Failed);
                result.error = Some(SweepError::MissingRepository(finding.key.clone()).to_string());
                results.push(result);
                continue;
            }
            by_repo
                .entry(finding.repository.clone())
                .or_default()
                .push(finding);
        }
        let repositories = by_repo.len();
        tracing::info!(
            total,
            repositories,
            max_concurrent_per_repo = self.max_concurrent_per_repo,
            "processing findings"
        );

        let mut tasks = JoinSet::new();
        for (repository, group) in by_repo {
            tracing::info!(repo = %repository, findings = group.len(), "queueing repository");
            let permits = Arc::new(Semaphore::new(self.max_concurrent_per_repo));
            for finding in group {
                let inner = self.inner.clone();
                let permits = permits.clone();
                tasks.spawn(async move {
                    let _permit = match permits.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            let mut result =
                                FindingResult::new(&finding, "no-thread", FindingOutcome::Errored);
                            result.error = Some(e.to_string());
                            return result;
                        }
                    };
                    guarded(inner, finding, total).await
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(error = %e, "finding task aborted");
                    results.push(FindingResult {
                        key: String::new(),
                        project: String::new(),
                        repository: String::new(),
                        thread_id: "no-thread".to_string(),
                        outcome: FindingOutcome::Errored,
                        exit_code: None,
                        timed_out: false,
                        error: Some(e.to_string()),
                        artifact: None,
                    });
                }
            }
        }

        let summary = RunSummary::from_results(results, repositories);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            blocked = summary.blocked,
            failed = summary.failed,
            skipped = summary.skipped,
            errored = summary.errored,
            repositories = summary.repositories,
            "run complete"
        );
        Ok(summary)
    }
}

/// Run [`process_finding`] on its own task so a panic is reported against the
/// finding it belongs to.
async fn guarded(inner: Arc<Inner>, finding: Finding, total: usize) -> FindingResult {
    let meta = FindingResult::new(&finding, "no-thread", FindingOutcome::Errored);
    match tokio::spawn(async move { process_finding(&inner, finding, total).await }).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(finding = %meta.key, error = %e, "finding task crashed");
            FindingResult {
                error: Some(e.to_string()),
                ..meta
            }
        }
    }
}

async fn process_finding(inner: &Inner, finding: Finding, total: usize) -> FindingResult {
    let tracker = &inner.tracker;
    let n = inner.processed.fetch_add(1, Ordering::Relaxed) + 1;
    let thread_id = paths::thread_id(
        &finding.repository,
        &finding.key,
        chrono::Utc::now().timestamp_millis(),
    );
    let mut result = FindingResult::new(&finding, &thread_id, FindingOutcome::Failed);

    let mut handle = match tracker.create(&finding) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(finding = %finding.key, error = %e, "could not create progress record");
            result.error = Some(format!("could not create progress record: {e}"));
            return result;
        }
    };

    tracing::info!(
        thread = %thread_id,
        finding = %finding.key,
        repo = %finding.repository,
        severity = %finding.severity,
        progress = %format!("{n}/{total}"),
        "starting finding"
    );
    tracker.append_event(
        &handle,
        ProgressEvent::ThreadStarted,
        &format!(
            "Starting Amp CLI thread for issue {}\nRepository: {}\nThread: {thread_id}\nProgress: {n}/{total}",
            finding.key, finding.repository
        ),
    );

    tracker.append_event(
        &handle,
        ProgressEvent::RepoSync,
        &format!("Syncing local clone of {}", finding.repository),
    );
    let repo = match inner.repos.ensure(&finding.repository).await {
        Ok(repo) => repo,
        Err(e) => return fail(tracker, handle, result, e.to_string()),
    };

    let duplicate = inner.detector.check(&repo, &finding).await;
    if duplicate.exists {
        let details = duplicate
            .details
            .unwrap_or_else(|| "existing fix found".to_string());
        tracker.append_event(
            &handle,
            ProgressEvent::Skipped,
            &format!("Issue already has a fix: {details}"),
        );
        let handle = tracker.finalize(handle, ProgressStatus::Skipped);
        tracing::info!(thread = %thread_id, finding = %finding.key, %details, "skipping finding");
        result.outcome = FindingOutcome::Skipped;
        result.error = Some(format!("Skipped - {details}"));
        result.artifact = Some(handle.path().to_path_buf());
        return result;
    }

    tracker.set_status(&mut handle, ProgressStatus::InProgress);
    let worktree = match inner
        .worktrees
        .acquire(&repo, &finding, &thread_id, tracker, &handle)
        .await
    {
        Ok(worktree) => worktree,
        Err(e) => return fail(tracker, handle, result, e.to_string()),
    };

    let prompt = prompt::fix_prompt(&finding);
    let invocation = inner
        .invoker
        .invoke(&worktree, &inner.worktrees, &prompt, tracker, &handle)
        .await;

    let status = invocation.status;
    tracker.append_event(
        &handle,
        ProgressEvent::for_status(status).unwrap_or(ProgressEvent::Failed),
        &terminal_summary(status, &invocation.result),
    );
    let handle = tracker.finalize(handle, status);

    result.outcome = FindingOutcome::from_status(status);
    result.exit_code = Some(invocation.result.exit_code);
    result.timed_out = invocation.result.timed_out;
    result.artifact = Some(handle.path().to_path_buf());
    result.error = match result.outcome {
        FindingOutcome::Blocked => Some("assistant needs manual intervention".to_string()),
        FindingOutcome::Failed if invocation.result.timed_out => Some(format!(
            "assistant timed out (exit code {})",
            invocation.result.exit_code
        )),
        FindingOutcome::Failed => Some(format!(
            "assistant exited with code {}",
            invocation.result.exit_code
        )),
        _ => None,
    };

    tracing::info!(
        thread = %thread_id,
        finding = %finding.key,
        outcome = result.outcome.as_str(),
        exit_code = invocation.result.exit_code,
        artifact = %handle.path().display(),
        "finding finished"
    );
    result
}

fn fail(
    tracker: &ProgressTracker,
    handle: ProgressHandle,
    mut result: FindingResult,
    error: String,
) -> FindingResult {
    tracing::error!(finding = %result.key, thread = %result.thread_id, %error, "finding failed");
    tracker.append_event(&handle, ProgressEvent::Failed, &error);
    let handle = tracker.finalize(handle, ProgressStatus::Failed);
    result.outcome = FindingOutcome::Failed;
    result.error = Some(error);
    result.artifact = Some(handle.path().to_path_buf());
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use crate::git::testing::*;
    use crate::invoker::testing::StubAssistant;
    use crate::invoker::AssistantRequest;
    use amp_agent::{OutputChunk, RunResult};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    fn finding(key: &str, repository: &str) -> Finding {
        Finding {
            key: key.to_string(),
            rule: "r".to_string(),
            severity: Severity::Major,
            message: "m".to_string(),
            component: "c".to_string(),
            line: None,
            project: "org_repo".to_string(),
            repository: repository.to_string(),
            issue_type: None,
            status: Some("OPEN".to_string()),
        }
    }

    struct Env {
        _root: TempDir,
        config: Config,
    }

    fn env() -> Env {
        let root = TempDir::new().unwrap();
        let config = Config {
            mirror_output: false,
            ..Config::default()
        }
        .resolved(root.path());
        let config = Config {
            worktree_dir: root.path().join("scratch"),
            ..config
        };
        Env { _root: root, config }
    }

    /// git stub: everything succeeds; `branch -r` reports `remote_branches`.
    fn git_stub(remote_branches: &'static str) -> Arc<ScriptedRunner> {
        ScriptedRunner::new(move |program, args| {
            if program == "gh" {
                return Ok(ok_output("[]"));
            }
            if args.iter().any(|a| a == "branch") {
                return Ok(ok_output(remote_branches));
            }
            Ok(ok_output(""))
        })
    }

    #[tokio::test]
    async fn pushed_fix_is_completed() {
        let env = env();
        let runner = git_stub("");
        let coordinator = Coordinator::new(
            &env.config,
            runner.clone(),
            StubAssistant::exits(0, "all done, pushed fix/sonar-X1"),
        );
        let summary = coordinator.run(vec![finding("X1", "org/repo")]).await.unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.succeeded, 1);
        let result = &summary.results[0];
        assert!(result.success());
        assert_eq!(result.outcome, FindingOutcome::Completed);
        let fixed = env.config.output_dir.join("org_repo/fixed-X1.md");
        assert_eq!(result.artifact.as_deref(), Some(fixed.as_path()));
        assert!(fixed.exists());
        assert!(!env.config.output_dir.join("org_repo/started-X1.md").exists());

        let doc = std::fs::read_to_string(&fixed).unwrap();
        for event in [
            "THREAD_STARTED",
            "REPO_SYNC",
            "WORKTREE_CREATE",
            "AMP_START",
            "WORKTREE_REMOVE",
            "COMPLETED",
        ] {
            assert!(doc.contains(event), "missing {event}");
        }
        assert!(runner.called_with("remove"));
        assert_eq!(coordinator.processed(), 1);
    }

    #[tokio::test]
    async fn clarification_request_is_blocked() {
        let env = env();
        let coordinator = Coordinator::new(
            &env.config,
            git_stub(""),
            StubAssistant::exits(0, "please clarify which file"),
        );
        let summary = coordinator.run(vec![finding("X1", "org/repo")]).await.unwrap();
        let result = &summary.results[0];
        assert!(!result.success());
        assert_eq!(result.outcome, FindingOutcome::Blocked);
        assert_eq!(summary.blocked, 1);
        assert!(env.config.output_dir.join("org_repo/blocked-X1.md").exists());
    }

    #[tokio::test]
    async fn existing_remote_branch_skips_without_worktree() {
        let env = env();
        let runner = git_stub("  origin/fix/sonar-X1\n");
        let stub = StubAssistant::exits(0, "pushed");
        let coordinator = Coordinator::new(&env.config, runner.clone(), stub.clone());
        let summary = coordinator.run(vec![finding("X1", "org/repo")]).await.unwrap();

        let result = &summary.results[0];
        assert!(result.success());
        assert!(result.error.as_deref().unwrap().starts_with("Skipped"));
        assert_eq!(summary.skipped, 1);
        assert!(!runner.called_with("add"));
        assert!(stub.requests.lock().unwrap().is_empty());
        assert!(env.config.output_dir.join("org_repo/skipped-X1.md").exists());
    }

    #[tokio::test]
    async fn non_zero_exit_is_failed() {
        let env = env();
        let coordinator =
            Coordinator::new(&env.config, git_stub(""), StubAssistant::exits(137, "working"));
        let summary = coordinator.run(vec![finding("X1", "org/repo")]).await.unwrap();
        let result = &summary.results[0];
        assert_eq!(result.outcome, FindingOutcome::Failed);
        assert_eq!(result.exit_code, Some(137));
        assert_eq!(summary.failed, 1);
        assert!(env.config.output_dir.join("org_repo/failed-X1.md").exists());
    }

    #[tokio::test]
    async fn clone_failure_fails_only_that_repository() {
        let env = env();
        let runner = ScriptedRunner::new(|_, args| {
            if args[0] == "clone" && args[1].contains("broken") {
                Ok(failed_output(128, "repository not found"))
            } else {
                Ok(ok_output(""))
            }
        });
        let coordinator =
            Coordinator::new(&env.config, runner, StubAssistant::exits(0, "committed"));
        let summary = coordinator
            .run(vec![finding("A", "org/broken"), finding("B", "org/repo")])
            .await
            .unwrap();
        assert_eq!(summary.repositories, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        let broken = summary.results.iter().find(|r| r.key == "A").unwrap();
        assert!(broken.error.as_deref().unwrap().contains("repository not found"));
    }

    #[tokio::test]
    async fn missing_repository_is_reported() {
        let env = env();
        let coordinator =
            Coordinator::new(&env.config, git_stub(""), StubAssistant::exits(0, "pushed"));
        let summary = coordinator.run(vec![finding("X1", "")]).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.repositories, 0);
        assert_eq!(summary.results[0].thread_id, "no-thread");
    }

    #[tokio::test]
    async fn previous_output_is_cleared() {
        let env = env();
        let stale = env.config.output_dir.join("org_repo/failed-OLD.md");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();
        let coordinator =
            Coordinator::new(&env.config, git_stub(""), StubAssistant::exits(0, "pushed"));
        coordinator.run(vec![finding("X1", "org/repo")]).await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let env = env();
        let config = Config {
            max_concurrent_per_repo: 0,
            ..env.config.clone()
        };
        let coordinator = Coordinator::new(&config, git_stub(""), StubAssistant::exits(0, ""));
        assert!(coordinator.run(vec![finding("X1", "org/repo")]).await.is_err());
    }

    /// Tracks how many runs overlap. Each run waits (up to a second) for
    /// `expected` runs to be active at once before finishing.
    struct SlowAssistant {
        expected: usize,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowAssistant {
        fn new(expected: usize) -> Arc<Self> {
            Arc::new(Self {
                expected,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }

        fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Assistant for SlowAssistant {
        async fn run(
            &self,
            _request: AssistantRequest,
            _on_chunk: &mut (dyn for<'c> FnMut(&'c OutputChunk) + Send),
        ) -> Result<RunResult> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            for _ in 0..100 {
                if self.peak() >= self.expected {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(RunResult {
                exit_code: 0,
                stdout: "committed".to_string(),
                stderr: String::new(),
                timed_out: false,
                duration_ms: 20,
            })
        }
    }

    #[tokio::test]
    async fn findings_in_one_repository_run_up_to_the_limit_in_parallel() {
        let env = env();
        let config = Config {
            max_concurrent_per_repo: 2,
            ..env.config.clone()
        };
        let assistant = SlowAssistant::new(2);
        let coordinator = Coordinator::new(&config, git_stub(""), assistant.clone());
        let findings = (0..6).map(|i| finding(&format!("K{i}"), "org/repo")).collect();
        let summary = coordinator.run(findings).await.unwrap();

        assert_eq!(summary.succeeded, 6);
        assert_eq!(assistant.peak(), 2);
        assert_eq!(coordinator.processed(), 6);
    }

    #[tokio::test]
    async fn repositories_do_not_share_a_limit() {
        let env = env();
        let config = Config {
            max_concurrent_per_repo: 1,
            ..env.config.clone()
        };
        let assistant = SlowAssistant::new(2);
        let coordinator = Coordinator::new(&config, git_stub(""), assistant.clone());
        let findings = vec![
            finding("A1", "org/alpha"),
            finding("A2", "org/alpha"),
            finding("B1", "org/beta"),
            finding("B2", "org/beta"),
        ];
        let summary = coordinator.run(findings).await.unwrap();

        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.repositories, 2);
        assert_eq!(assistant.peak(), 2);
    }

    #[test]
    fn summary_counts_outcomes() {
        let base = finding("X", "org/repo");
        let mk = |key: &str, outcome| FindingResult {
            key: key.to_string(),
            ..FindingResult::new(&base, "t", outcome)
        };
        let summary = RunSummary::from_results(
            vec![
                mk("a", FindingOutcome::Completed),
                mk("b", FindingOutcome::Skipped),
                mk("c", FindingOutcome::Failed),
                mk("d", FindingOutcome::Blocked),
                mk("e", FindingOutcome::Errored),
            ],
            1,
        );
        assert_eq!(
            (
                summary.total,
                summary.succeeded,
                summary.skipped,
                summary.failed,
                summary.blocked,
                summary.errored
            ),
            (5, 1, 1, 1, 1, 1)
        );
        assert!(!summary.all_succeeded());
    }
}
