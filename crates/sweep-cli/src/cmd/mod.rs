pub mod check;
pub mod config;
pub mod plan;
pub mod run;

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use sweep_core::config::Config;
use sweep_core::finding::Finding;
use sweep_core::invoker::AmpAssistant;
use sweep_core::source::{AssistantFindingSource, FindingSource, FixtureFindingSource};

/// Where findings come from. Shared by `run` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Organization the projects belong to
    #[arg(long, env = "SONAR_ORG")]
    pub org: Option<String>,

    /// Project key to fetch findings for (repeatable)
    #[arg(long = "project", value_name = "KEY")]
    pub projects: Vec<String>,

    /// Read findings from a JSON or YAML file instead of asking the assistant
    #[arg(long, value_name = "PATH", conflicts_with = "sample")]
    pub fixture: Option<PathBuf>,

    /// Use the built-in sample findings
    #[arg(long)]
    pub sample: bool,
}

impl SourceArgs {
    /// True when findings are listed by the assistant itself.
    pub fn uses_assistant(&self) -> bool {
        self.fixture.is_none() && !self.sample
    }

    fn source(&self, config: &Config) -> Box<dyn FindingSource> {
        if self.sample {
            Box::new(FixtureFindingSource::sample())
        } else if let Some(path) = &self.fixture {
            Box::new(FixtureFindingSource::new(Some(path.clone())))
        } else {
            let assistant =
                AmpAssistant::new(config.assistant_bin.clone(), config.capture_limit_bytes);
            Box::new(AssistantFindingSource::new(
                Arc::new(assistant),
                config.assistant_timeout(),
            ))
        }
    }

    pub async fn fetch(&self, config: &Config) -> anyhow::Result<Vec<Finding>> {
        if self.uses_assistant() && self.projects.is_empty() {
            anyhow::bail!("pass at least one --project, or use --fixture / --sample");
        }
        let org = self.org.as_deref().unwrap_or_default();
        self.source(config)
            .fetch_findings(org, &self.projects)
            .await
            .context("failed to fetch findings")
    }
}

/// A runtime for the async parts of a command.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}
