use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = ".sonar-sweep.yaml";
pub const DEFAULT_REPOS_DIR: &str = "repos";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

pub const WORKTREE_PREFIX: &str = "worktree-";
pub const THREAD_PREFIX: &str = "thread-";
pub const BRANCH_PREFIX: &str = "fix/sonar-";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// `output_dir/<projectKey>`
pub fn project_output_dir(output_dir: &Path, project_key: &str) -> PathBuf {
    output_dir.join(sanitize_component(project_key))
}

/// `output_dir/<projectKey>/<prefix>-<findingKey>.md`
pub fn progress_file(output_dir: &Path, project_key: &str, prefix: &str, key: &str) -> PathBuf {
    project_output_dir(output_dir, project_key).join(format!(
        "{prefix}-{}.md",
        sanitize_component(key)
    ))
}

/// `org/repo` → `org-repo`, the form used in directory names and thread ids.
pub fn repo_slug(repository: &str) -> String {
    sanitize_component(&repository.replace('/', "-"))
}

/// Local clone location: `repos_dir/<org>-<repo>`.
pub fn repo_clone_dir(repos_dir: &Path, repository: &str) -> PathBuf {
    repos_dir.join(repo_slug(repository))
}

/// `thread-<org>-<repo>-<key>-<millis>`
pub fn thread_id(repository: &str, key: &str, millis: i64) -> String {
    format!("{}{millis}", thread_id_prefix(repository, key))
}

/// Everything in a thread id before the timestamp. Two attempts on the same
/// finding share this prefix.
pub fn thread_id_prefix(repository: &str, key: &str) -> String {
    format!(
        "{THREAD_PREFIX}{}-{}-",
        repo_slug(repository),
        sanitize_component(key)
    )
}

pub fn worktree_path(worktree_dir: &Path, thread_id: &str) -> PathBuf {
    worktree_dir.join(format!("{WORKTREE_PREFIX}{thread_id}"))
}

/// True when `dir_name` is `worktree-thread-<org>-<repo>-<key>-<millis>` for
/// exactly this finding. Keys may contain `-`, so anything after the prefix
/// other than a timestamp belongs to a different finding.
pub fn is_worktree_of(dir_name: &str, repository: &str, key: &str) -> bool {
    let prefix = format!("{WORKTREE_PREFIX}{}", thread_id_prefix(repository, key));
    dir_name
        .strip_prefix(&prefix)
        .is_some_and(|millis| !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()))
}

// ---------------------------------------------------------------------------
// Sanitization
// ---------------------------------------------------------------------------

static UNSAFE_RE: OnceLock<Regex> = OnceLock::new();

fn unsafe_re() -> &'static Regex {
    UNSAFE_RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap())
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_` so keys coming from the
/// analysis server can never escape the directory they are joined onto.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned = unsafe_re().replace_all(raw, "_");
    match cleaned.as_ref() {
        "" => "_".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned.into_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
