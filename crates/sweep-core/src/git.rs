//! Thin async wrappers over the `git` and `gh` command-line tools.
//!
//! Every invocation goes through a [`CommandRunner`] so tests can script
//! tool responses without touching real repositories.

use crate::error::{Result, SweepError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CommandRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[String], cwd: Option<&Path>)
        -> io::Result<CommandOutput>;
}

#[derive(Debug, Default)]
pub struct ProcessCommandRunner;

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> io::Result<CommandOutput> {
        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        let output = command.output().await?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn command_failed(args: &[String], output: &CommandOutput) -> SweepError {
    let detail = if output.stderr.trim().is_empty() {
        format!("exit code {}", output.status)
    } else {
        format!("exit code {}: {}", output.status, output.stderr.trim())
    };
    SweepError::Git {
        args: args.join(" "),
        detail,
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Git {
    runner: Arc<dyn CommandRunner>,
    binary: PathBuf,
}

impl Git {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    async fn exec(&self, args: Vec<String>) -> Result<CommandOutput> {
        tracing::debug!(args = %args.join(" "), "git");
        let output = self
            .runner
            .run(&self.binary, &args, None)
            .await
            .map_err(|e| SweepError::ToolUnavailable {
                tool: self.binary.display().to_string(),
                detail: e.to_string(),
            })?;
        Ok(output)
    }

    async fn exec_checked(&self, args: Vec<String>) -> Result<CommandOutput> {
        let output = self.exec(args.clone()).await?;
        if !output.success() {
            return Err(command_failed(&args, &output));
        }
        Ok(output)
    }

    pub async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.exec_checked(vec!["clone".into(), url.into(), path_arg(dest)])
            .await
            .map(|_| ())
    }

    pub async fn fetch(&self, repo: &Path) -> Result<()> {
        self.exec_checked(vec![
            "-C".into(),
            path_arg(repo),
            "fetch".into(),
            "--prune".into(),
            "origin".into(),
        ])
        .await
        .map(|_| ())
    }

    pub async fn pull(&self, repo: &Path, branch: &str) -> Result<()> {
        self.exec_checked(vec![
            "-C".into(),
            path_arg(repo),
            "pull".into(),
            "origin".into(),
            branch.into(),
        ])
        .await
        .map(|_| ())
    }

    /// `git worktree add --detach <path>`; the caller creates the branch.
    pub async fn worktree_add(&self, repo: &Path, path: &Path) -> Result<()> {
        self.exec_checked(vec![
            "-C".into(),
            path_arg(repo),
            "worktree".into(),
            "add".into(),
            "--detach".into(),
            path_arg(path),
        ])
        .await
        .map(|_| ())
    }

    pub async fn worktree_remove(&self, repo: &Path, path: &Path) -> Result<()> {
        self.exec_checked(vec![
            "-C".into(),
            path_arg(repo),
            "worktree".into(),
            "remove".into(),
            path_arg(path),
            "--force".into(),
        ])
        .await
        .map(|_| ())
    }

    pub async fn worktree_prune(&self, repo: &Path) -> Result<()> {
        self.exec_checked(vec![
            "-C".into(),
            path_arg(repo),
            "worktree".into(),
            "prune".into(),
        ])
        .await
        .map(|_| ())
    }

    pub async fn checkout_new_branch(&self, worktree: &Path, branch: &str) -> Result<()> {
        self.exec_checked(vec![
            "-C".into(),
            path_arg(worktree),
            "checkout".into(),
            "-b".into(),
            branch.into(),
        ])
        .await
        .map(|_| ())
    }

    /// Remote-tracking branches matching `pattern`, e.g. `origin/fix/sonar-X1*`.
    pub async fn remote_branches(&self, repo: &Path, pattern: &str) -> Result<Vec<String>> {
        let output = self
            .exec_checked(vec![
                "-C".into(),
                path_arg(repo),
                "branch".into(),
                "-r".into(),
                "--list".into(),
                pattern.into(),
            ])
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("origin/"))
            .map(str::to_string)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Gh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Clone)]
pub struct Gh {
    runner: Arc<dyn CommandRunner>,
    binary: PathBuf,
}

impl Gh {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Pull requests in the repository at `repo` whose text matches `search`.
    pub async fn pr_list(&self, repo: &Path, search: &str) -> Result<Vec<PullRequestSummary>> {
        let args = vec![
            "pr".to_string(),
            "list".to_string(),
            "--search".to_string(),
            format!("\"{search}\""),
            "--json".to_string(),
            "title,url,state".to_string(),
        ];
        let output = self
            .runner
            .run(&self.binary, &args, Some(repo))
            .await
            .map_err(|e| SweepError::ToolUnavailable {
                tool: self.binary.display().to_string(),
                detail: e.to_string(),
            })?;
        if !output.success() {
            return Err(SweepError::ToolUnavailable {
                tool: self.binary.display().to_string(),
                detail: command_failed(&args, &output).to_string(),
            });
        }
        let body = output.stdout.trim();
        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(body)?)
    }
}

// ---------------------------------------------------------------------------
// Scripted runner for tests
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
