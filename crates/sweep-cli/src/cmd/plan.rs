use crate::cmd::{runtime, SourceArgs};
use crate::output::{print_json, print_table};
use anyhow::Context;
use sweep_core::config::Config;
use sweep_core::plan::RunPlan;
use std::path::Path;

/// Fetch findings and describe what `run` would do with them.
pub fn run(root: &Path, source: SourceArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let findings = runtime()?.block_on(source.fetch(&config))?;
    let plan = RunPlan::from_findings(&findings);

    if json {
        return print_json(&plan);
    }

    if plan.total == 0 {
        println!("No open findings.");
        return Ok(());
    }

    println!(
        "{} finding(s) across {} repository(ies)",
        plan.total,
        plan.repositories.len()
    );
    println!();

    let rows = plan
        .projects
        .iter()
        .map(|p| {
            let severities = p
                .by_severity
                .iter()
                .map(|(s, n)| format!("{s}: {n}"))
                .collect::<Vec<_>>()
                .join(", ");
            vec![p.project.clone(), p.findings.to_string(), severities]
        })
        .collect();
    print_table(&["PROJECT", "FINDINGS", "SEVERITY"], rows);
    println!();

    let rows = plan
        .repositories
        .iter()
        .map(|(repo, n)| {
            vec![
                repo.clone(),
                n.to_string(),
                config.clone_url(repo),
            ]
        })
        .collect();
    print_table(&["REPOSITORY", "FINDINGS", "CLONE URL"], rows);
    println!();

    println!("First {} finding(s):", plan.preview.len());
    let rows = plan
        .preview
        .iter()
        .map(|f| {
            let location = match f.line {
                Some(line) => format!("{}:{line}", f.component),
                None => f.component.clone(),
            };
            vec![
                f.key.clone(),
                f.severity.to_string(),
                f.rule.clone(),
                location,
                f.message.clone(),
            ]
        })
        .collect();
    print_table(&["KEY", "SEVERITY", "RULE", "LOCATION", "MESSAGE"], rows);
    Ok(())
}
