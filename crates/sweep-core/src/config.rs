use crate::error::{Result, SweepError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime settings, read from `.sonar-sweep.yaml` and then overridden by the
/// environment. Every field has a default, so the file is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where repositories are cloned. Relative paths resolve against the root.
    pub repos_dir: PathBuf,
    /// Where progress artifacts are written.
    pub output_dir: PathBuf,
    /// Scratch parent for per-finding worktrees.
    pub worktree_dir: PathBuf,
    pub max_concurrent_per_repo: usize,
    pub assistant_timeout_ms: u64,
    pub assistant_bin: PathBuf,
    pub git_bin: PathBuf,
    pub gh_bin: PathBuf,
    /// Query open pull requests during duplicate detection.
    pub check_pull_requests: bool,
    pub base_branch: String,
    /// `{repo}` is replaced by `org/name`.
    pub clone_url_template: String,
    /// Echo assistant output to the console while it runs.
    pub mirror_output: bool,
    pub capture_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos_dir: PathBuf::from(paths::DEFAULT_REPOS_DIR),
            output_dir: PathBuf::from(paths::DEFAULT_OUTPUT_DIR),
            worktree_dir: std::env::temp_dir(),
            max_concurrent_per_repo: 3,
            assistant_timeout_ms: 300_000,
            assistant_bin: PathBuf::from(amp_agent::DEFAULT_EXECUTABLE),
            git_bin: PathBuf::from("git"),
            gh_bin: PathBuf::from("gh"),
            check_pull_requests: true,
            base_branch: "main".to_string(),
            clone_url_template: "https://github.com/{repo}.git".to_string(),
            mirror_output: true,
            capture_limit_bytes: amp_agent::DEFAULT_CAPTURE_LIMIT,
        }
    }
}

impl Config {
    /// Load `.sonar-sweep.yaml` from `root` (defaults when absent), apply
    /// process environment overrides, and resolve relative paths.
    pub fn load(root: &Path) -> Result<Self> {
        let mut cfg = Self::load_file(root)?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(cfg.resolved(root))
    }

    /// Like [`Config::load`] but ignores the environment.
    pub fn load_file(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Apply environment overrides through `lookup` so tests need not touch
    /// the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("REPOS_DIR") {
            self.repos_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty("WORKTREE_PARENT_DIR") {
            self.worktree_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty("MAX_CONCURRENT_PER_REPO") {
            self.max_concurrent_per_repo = parse_number("MAX_CONCURRENT_PER_REPO", &v)?;
        }
        if let Some(v) = non_empty("AMP_TIMEOUT_MS") {
            self.assistant_timeout_ms = parse_number("AMP_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = non_empty("AMP_BIN") {
            self.assistant_bin = PathBuf::from(v);
        }
        if let Some(v) = non_empty("GIT_BIN") {
            self.git_bin = PathBuf::from(v);
        }
        if let Some(v) = non_empty("GH_BIN") {
            self.gh_bin = PathBuf::from(v);
        }
        Ok(())
    }

    /// Make directory settings absolute against `root`.
    pub fn resolved(mut self, root: &Path) -> Self {
        for dir in [
            &mut self.repos_dir,
            &mut self.output_dir,
            &mut self.worktree_dir,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        self
    }

    pub fn assistant_timeout(&self) -> Duration {
        Duration::from_millis(self.assistant_timeout_ms)
    }

    pub fn clone_url(&self, repository: &str) -> String {
        self.clone_url_template.replace("{repo}", repository)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.max_concurrent_per_repo == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "max_concurrent_per_repo must be at least 1".to_string(),
            });
        } else if self.max_concurrent_per_repo > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "max_concurrent_per_repo is {}; each slot runs its own assistant process",
                    self.max_concurrent_per_repo
                ),
            });
        }

        if self.assistant_timeout_ms < 1_000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "assistant_timeout_ms is {}ms; most fixes will be killed before finishing",
                    self.assistant_timeout_ms
                ),
            });
        }

        if !self.clone_url_template.contains("{repo}") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "clone_url_template '{}' does not contain {{repo}}",
                    self.clone_url_template
                ),
            });
        }

        if self.base_branch.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "base_branch must not be empty".to_string(),
            });
        }

        warnings
    }

    /// Turn the first error-level warning into a hard error.
    pub fn ensure_valid(&self) -> Result<Vec<ConfigWarning>> {
        let warnings = self.validate();
        if let Some(err) = warnings.iter().find(|w| w.level == WarnLevel::Error) {
            return Err(SweepError::InvalidConfig(err.message.clone()));
        }
        Ok(warnings)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| SweepError::InvalidConfig(format!("{name}={raw:?} is not a number")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
