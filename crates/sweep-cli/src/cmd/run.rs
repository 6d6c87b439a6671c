use crate::cmd::{runtime, SourceArgs};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use std::path::Path;
use sweep_core::config::Config;
use sweep_core::coordinator::{Coordinator, RunSummary};
use sweep_core::preflight;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Concurrent fixes per repository (overrides config)
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Assistant timeout per finding in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Do not probe git, gh and the assistant before starting
    #[arg(long)]
    pub skip_preflight: bool,
}

pub fn run(root: &Path, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(n) = args.max_concurrent {
        config.max_concurrent_per_repo = n;
    }
    if let Some(ms) = args.timeout_ms {
        config.assistant_timeout_ms = ms;
    }
    if json {
        config.mirror_output = false;
    }
    for warning in config.ensure_valid().context("invalid configuration")? {
        tracing::warn!("{}", warning.message);
    }

    let summary = runtime()?.block_on(async {
        if !args.skip_preflight {
            preflight::run(&config, args.source.uses_assistant())
                .await
                .ensure_ok()
                .context("preflight failed")?;
        }

        let findings = args.source.fetch(&config).await?;
        tracing::info!(total = findings.len(), "starting run");
        Coordinator::from_config(&config)
            .run(findings)
            .await
            .context("run failed")
    })?;

    if json {
        print_json(&summary)?;
    } else {
        print_summary(&summary);
    }

    if !summary.all_succeeded() {
        anyhow::bail!(
            "{} of {} finding(s) were not fixed",
            summary.blocked + summary.failed + summary.errored,
            summary.total
        );
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.total == 0 {
        println!("No open findings.");
        return;
    }

    let rows = summary
        .results
        .iter()
        .map(|r| {
            let exit = r.exit_code.map(|c| c.to_string()).unwrap_or_default();
            let detail = r
                .error
                .clone()
                .or_else(|| r.artifact.as_ref().map(|p| p.display().to_string()))
                .unwrap_or_default();
            vec![
                r.key.clone(),
                r.repository.clone(),
                r.outcome.as_str().to_string(),
                exit,
                detail,
            ]
        })
        .collect();
    print_table(&["KEY", "REPOSITORY", "OUTCOME", "EXIT", "DETAIL"], rows);
    println!();
    println!(
        "{} finding(s) in {} repository(ies): {} fixed, {} skipped, {} blocked, {} failed, {} errored",
        summary.total,
        summary.repositories,
        summary.succeeded,
        summary.skipped,
        summary.blocked,
        summary.failed,
        summary.errored
    );
}
