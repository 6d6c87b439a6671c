use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Blocker,
            Severity::Critical,
            Severity::Major,
            Severity::Minor,
            Severity::Info,
            Severity::Unknown,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Blocker => "BLOCKER",
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Info => "INFO",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "BLOCKER" => Severity::Blocker,
            "CRITICAL" => Severity::Critical,
            "MAJOR" => Severity::Major,
            "MINOR" => Severity::Minor,
            "INFO" => Severity::Info,
            _ => Severity::Unknown,
        })
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// One static-analysis issue to remediate. Built by a
/// [`FindingSource`](crate::source::FindingSource) and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub key: String,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Owning project key on the analysis server.
    #[serde(default)]
    pub project: String,
    /// `org/name`. Filled from the project key when the source omits it.
    #[serde(default)]
    pub repository: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Finding {
    /// Fill `repository` from the project key when it is blank.
    pub fn with_derived_repository(mut self) -> Self {
        if self.repository.trim().is_empty() {
            self.repository = derive_repository(&self.project);
        }
        self
    }

    /// `fix/sonar-<key>`
    pub fn branch_name(&self) -> String {
        format!("{}{}", paths::BRANCH_PREFIX, self.key)
    }

    /// Pattern for `git branch -r --list` matching any prior fix attempt.
    pub fn remote_branch_pattern(&self) -> String {
        format!("origin/{}*", self.branch_name())
    }

    /// Title used for the commit and the pull request; also what the
    /// duplicate detector searches for.
    pub fn pr_title(&self) -> String {
        format!("Fix SonarQube issue {}: {}", self.key, self.message)
    }

    pub fn pr_search(&self) -> String {
        format!("Fix SonarQube issue {}", self.key)
    }

    pub fn is_open(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("OPEN"))
            .unwrap_or(true)
    }
}

/// Map an analysis project key onto a hosting repository.
///
/// `org_repo_name` → `org/repo-name`, `org-repo` → `org/repo`; a key already
/// containing `/` is kept, anything else lands under `unknown-org/`.
pub fn derive_repository(project: &str) -> String {
    if let Some((org, rest)) = project.split_once('_') {
        return format!("{org}/{}", rest.replace('_', "-"));
    }
    if let Some((org, rest)) = project.split_once('-') {
        return format!("{org}/{rest}");
    }
    if project.contains('/') {
        return project.to_string();
    }
    tracing::warn!(project, "could not derive a repository from project key");
    format!("unknown-org/{project}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
