mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, run::RunArgs, SourceArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sonar-sweep",
    about = "Fix open SonarQube findings in parallel, one git worktree and amp thread per finding",
    version,
    propagate_version = true
)]
struct Cli {
    /// Working root (default: auto-detect from .sonar-sweep.yaml)
    #[arg(long, global = true, env = "SWEEP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch findings and fix each one in its own worktree
    Run(RunArgs),

    /// Show what a run would process, without changing anything
    Plan(SourceArgs),

    /// Verify git, gh and the assistant are usable
    Check {
        /// Skip asking the assistant which analysis tools it has
        #[arg(long)]
        skip_tools: bool,
    },

    /// Inspect or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Run(args) => cmd::run::run(&root, args, cli.json),
        Commands::Plan(source) => cmd::plan::run(&root, source, cli.json),
        Commands::Check { skip_tools } => cmd::check::run(&root, skip_tools, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
