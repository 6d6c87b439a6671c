use crate::finding::{Finding, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Findings shown in full by a dry run.
pub const PREVIEW_LEN: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectPlan {
    pub project: String,
    pub findings: usize,
    pub by_severity: BTreeMap<Severity, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub total: usize,
    pub projects: Vec<ProjectPlan>,
    /// Findings per `org/name` repository.
    pub repositories: BTreeMap<String, usize>,
    pub preview: Vec<Finding>,
}

impl RunPlan {
    /// Describe what a run over `findings` would touch, without touching it.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut projects: BTreeMap<&str, ProjectPlan> = BTreeMap::new();
        let mut repositories: BTreeMap<String, usize> = BTreeMap::new();

        for finding in findings {
            let plan = projects
                .entry(finding.project.as_str())
                .or_insert_with(|| ProjectPlan {
                    project: finding.project.clone(),
                    findings: 0,
                    by_severity: BTreeMap::new(),
                });
            plan.findings += 1;
            *plan.by_severity.entry(finding.severity).or_default() += 1;
            *repositories.entry(finding.repository.clone()).or_default() += 1;
        }

        Self {
            total: findings.len(),
            projects: projects.into_values().collect(),
            repositories,
            preview: findings.iter().take(PREVIEW_LEN).cloned().collect(),
        }
    }
}
