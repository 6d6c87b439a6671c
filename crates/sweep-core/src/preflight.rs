use crate::config::Config;
use crate::error::{Result, SweepError};
use crate::prompt::TOOLS_PROBE_PROMPT;
use amp_agent::InvokeOptions;
use serde::Serialize;
use std::time::Duration;

/// How long each assistant probe may take.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckLevel {
    Ok,
    Warning,
    Fatal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightCheck {
    pub name: &'static str,
    pub level: CheckLevel,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreflightReport {
    pub checks: Vec<PreflightCheck>,
}

impl PreflightReport {
    fn push(&mut self, name: &'static str, level: CheckLevel, detail: impl Into<String>) {
        let detail = detail.into();
        match level {
            CheckLevel::Ok => tracing::info!(check = name, %detail, "preflight ok"),
            CheckLevel::Warning => tracing::warn!(check = name, %detail, "preflight warning"),
            CheckLevel::Fatal => tracing::error!(check = name, %detail, "preflight failed"),
        }
        self.checks.push(PreflightCheck {
            name,
            level,
            detail,
        });
    }

    /// The first fatal check as an error.
    pub fn ensure_ok(&self) -> Result<()> {
        match self.checks.iter().find(|c| c.level == CheckLevel::Fatal) {
            None => Ok(()),
            Some(check) if check.name == "assistant" => {
                Err(SweepError::AssistantUnavailable(check.detail.clone()))
            }
            Some(check) => Err(SweepError::ToolUnavailable {
                tool: check.name.to_string(),
                detail: check.detail.clone(),
            }),
        }
    }
}

/// Verify the external tools a run depends on.
///
/// `git` and a working assistant are required. `gh` (when pull-request checks
/// are enabled) and the assistant's static-analysis tooling only warn.
pub async fn run(config: &Config, probe_tools: bool) -> PreflightReport {
    let mut report = PreflightReport::default();

    match which::which(&config.git_bin) {
        Ok(path) => report.push("git", CheckLevel::Ok, path.display().to_string()),
        Err(e) => report.push(
            "git",
            CheckLevel::Fatal,
            format!("{}: {e}", config.git_bin.display()),
        ),
    }

    if config.check_pull_requests {
        match which::which(&config.gh_bin) {
            Ok(path) => report.push("gh", CheckLevel::Ok, path.display().to_string()),
            Err(e) => report.push(
                "gh",
                CheckLevel::Warning,
                format!(
                    "{}: {e}; duplicate detection will only check remote branches",
                    config.gh_bin.display()
                ),
            ),
        }
    }

    match amp_agent::probe(&config.assistant_bin, PROBE_TIMEOUT).await {
        Ok(result) => report.push(
            "assistant",
            CheckLevel::Ok,
            format!("answered in {}ms", result.duration_ms),
        ),
        Err(e) => {
            report.push(
                "assistant",
                CheckLevel::Fatal,
                format!("{}: {e}", config.assistant_bin.display()),
            );
            return report;
        }
    }

    if probe_tools {
        let opts = InvokeOptions {
            executable: config.assistant_bin.clone(),
            timeout: Some(PROBE_TIMEOUT),
            ..Default::default()
        };
        match amp_agent::invoke(TOOLS_PROBE_PROMPT, opts).await {
            Ok(result)
                if result.success() && result.stdout.to_lowercase().contains("sonarqube") =>
            {
                report.push("analysis-tools", CheckLevel::Ok, "SonarQube tools are available")
            }
            Ok(result) => report.push(
                "analysis-tools",
                CheckLevel::Warning,
                format!(
                    "assistant did not report SonarQube tools (exit code {})",
                    result.exit_code
                ),
            ),
            Err(e) => report.push("analysis-tools", CheckLevel::Warning, e.to_string()),
        }
    }

    report
}
