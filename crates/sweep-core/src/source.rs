//! Where findings come from.
//!
//! Two interchangeable [`FindingSource`]s: one that asks the assistant to
//! query the analysis server through its tools, and one that reads a fixture
//! file (or the built-in sample set).

use crate::error::{Result, SweepError};
use crate::finding::{Finding, Severity};
use crate::invoker::{Assistant, AssistantRequest};
use crate::prompt;
use amp_agent::OutputChunk;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

#[async_trait]
pub trait FindingSource: Send + Sync {
    /// Open findings for `org`, limited to `project_keys` when non-empty.
    async fn fetch_findings(&self, org: &str, project_keys: &[String]) -> Result<Vec<Finding>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FindingDocument {
    Envelope { issues: Vec<Finding> },
    List(Vec<Finding>),
}

impl FindingDocument {
    fn into_findings(self) -> Vec<Finding> {
        match self {
            FindingDocument::Envelope { issues } => issues,
            FindingDocument::List(issues) => issues,
        }
    }
}

fn in_projects(finding: &Finding, project_keys: &[String]) -> bool {
    project_keys.is_empty() || project_keys.iter().any(|p| p == &finding.project)
}

// ---------------------------------------------------------------------------
// AssistantFindingSource
// ---------------------------------------------------------------------------

pub struct AssistantFindingSource {
    assistant: Arc<dyn Assistant>,
    timeout: Duration,
}

impl AssistantFindingSource {
    pub fn new(assistant: Arc<dyn Assistant>, timeout: Duration) -> Self {
        Self { assistant, timeout }
    }
}

#[async_trait]
impl FindingSource for AssistantFindingSource {
    async fn fetch_findings(&self, org: &str, project_keys: &[String]) -> Result<Vec<Finding>> {
        if project_keys.is_empty() {
            return Err(SweepError::Source(
                "the assistant-backed source needs at least one project key".to_string(),
            ));
        }

        let mut findings = Vec::new();
        for project in project_keys {
            tracing::info!(org, project = %project, "fetching findings through the assistant");
            let request = AssistantRequest {
                prompt: prompt::fetch_prompt(project),
                cwd: None,
                timeout: Some(self.timeout),
            };
            let result = self.assistant.run(request, &mut |_: &OutputChunk| {}).await?;
            if !result.success() {
                return Err(SweepError::Source(format!(
                    "assistant exited with code {} while listing {project}",
                    result.exit_code
                )));
            }
            let mut batch = parse_issues(&result.stdout)?;
            for finding in &mut batch {
                if finding.project.is_empty() {
                    finding.project = project.clone();
                }
            }
            findings.extend(
                batch
                    .into_iter()
                    .filter(|f| in_projects(f, project_keys))
                    .map(Finding::with_derived_repository),
            );
        }
        tracing::info!(org, total = findings.len(), "fetched findings");
        Ok(findings)
    }
}

static JSON_BLOCK_RE: OnceLock<Regex> = OnceLock::new();

fn json_block_re() -> &'static Regex {
    JSON_BLOCK_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// Pull the outermost `{...}` block out of free-form assistant output and
/// keep the issues whose status is `OPEN`.
pub fn parse_issues(output: &str) -> Result<Vec<Finding>> {
    let Some(block) = json_block_re().find(output) else {
        return Err(SweepError::Source(
            "assistant output contained no JSON object".to_string(),
        ));
    };
    let doc: FindingDocument = serde_json::from_str(block.as_str())?;
    Ok(doc
        .into_findings()
        .into_iter()
        .filter(|f| {
            f.status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("OPEN"))
        })
        .collect())
}

// ---------------------------------------------------------------------------
// FixtureFindingSource
// ---------------------------------------------------------------------------

/// Reads findings from a JSON or YAML file, or serves [`sample_findings`]
/// when no file is given.
#[derive(Debug, Clone, Default)]
pub struct FixtureFindingSource {
    path: Option<PathBuf>,
}

impl FixtureFindingSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn sample() -> Self {
        Self { path: None }
    }

    fn load(path: &Path) -> Result<Vec<Finding>> {
        let data = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let doc: FindingDocument = if is_json {
            serde_json::from_str(&data)?
        } else {
            serde_yaml::from_str(&data)?
        };
        Ok(doc.into_findings())
    }
}

#[async_trait]
impl FindingSource for FixtureFindingSource {
    async fn fetch_findings(&self, org: &str, project_keys: &[String]) -> Result<Vec<Finding>> {
        let all = match &self.path {
            Some(path) => {
                tracing::info!(org, path = %path.display(), "loading findings from fixture");
                Self::load(path)?
            }
            None => {
                tracing::info!(org, "using built-in sample findings");
                sample_findings()
            }
        };
        Ok(all
            .into_iter()
            .filter(|f| f.is_open() && in_projects(f, project_keys))
            .map(Finding::with_derived_repository)
            .collect())
    }
}

/// Four real findings from a demo project, useful for dry runs.
pub fn sample_findings() -> Vec<Finding> {
    const PROJECT: &str = "Isuru-F_demo-latest-audiobooks";
    let sample = |key: &str,
                  rule: &str,
                  path: &str,
                  severity: Severity,
                  message: &str,
                  line: u32,
                  kind: &str| Finding {
        key: key.to_string(),
        rule: rule.to_string(),
        severity,
        message: message.to_string(),
        component: format!("{PROJECT}:{path}"),
        line: Some(line),
        project: PROJECT.to_string(),
        repository: String::new(),
        issue_type: Some(kind.to_string()),
        status: Some("OPEN".to_string()),
    };
    vec![
        sample(
            "AZhyh5RwQkXnhmx4R6NJ",
            "typescript:S1128",
            "client/src/components/__tests__/AudiobookCard.spec.ts",
            Severity::Minor,
            "Remove this unused import of 'vi'.",
            1,
            "CODE_SMELL",
        ),
        sample(
            "AZhyh5QGQkXnhmx4R6NI",
            "css:S4666",
            "client/src/assets/base.css",
            Severity::Major,
            "Unexpected duplicate selector \":root\", first used at line 2",
            25,
            "CODE_SMELL",
        ),
        sample(
            "AZhyh5R5QkXnhmx4R6NK",
            "Web:S6819",
            "client/src/components/icons/IconTooling.vue",
            Severity::Major,
            "Use <img> instead of the img role to ensure accessibility across all devices.",
            3,
            "CODE_SMELL",
        ),
        sample(
            "AZhyh5SRQkXnhmx4R6NN",
            "secrets:S6699",
            "server/.env",
            Severity::Blocker,
            "Make sure this Spotify key gets revoked, changed, and removed from the code.",
            3,
            "VULNERABILITY",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
