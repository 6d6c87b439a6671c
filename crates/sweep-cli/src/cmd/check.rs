use crate::cmd::runtime;
use crate::output::{print_json, print_table};
use anyhow::Context;
use sweep_core::config::Config;
use sweep_core::preflight::{self, CheckLevel};
use std::path::Path;

pub fn run(root: &Path, skip_tools: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let report = runtime()?.block_on(preflight::run(&config, !skip_tools));

    if json {
        print_json(&report)?;
    } else {
        let rows = report
            .checks
            .iter()
            .map(|c| {
                let level = match c.level {
                    CheckLevel::Ok => "ok",
                    CheckLevel::Warning => "warning",
                    CheckLevel::Fatal => "FATAL",
                };
                vec![c.name.to_string(), level.to_string(), c.detail.clone()]
            })
            .collect();
        print_table(&["CHECK", "STATUS", "DETAIL"], rows);
    }

    report.ensure_ok().context("preflight failed")?;
    Ok(())
}
