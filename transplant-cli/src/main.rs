//! transplant - copy issues and pull requests between GitHub repositories
//!
//! Jobs read everything from one immutable configuration value; flags only
//! override coordinates or toggle behavior.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use transplant_core::{Config, RepoRef};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{IssuesArgs, PrsArgs, ProjectsArgs};

/// Copy issues and pull requests (and their project metadata) between repositories
#[derive(Parser, Debug)]
#[command(name = "transplant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ~/.config/transplant/config.toml)
    #[arg(long, global = true, env = "TRANSPLANT_CONFIG")]
    config: Option<PathBuf>,

    /// Source repository (owner/repo), overrides config
    #[arg(long, global = true, env = "TRANSPLANT_SOURCE")]
    source: Option<String>,

    /// Destination repository (owner/repo), overrides config
    #[arg(long, global = true, env = "TRANSPLANT_DEST")]
    dest: Option<String>,

    /// ProjectV2 node id, overrides config
    #[arg(long, global = true, env = "TRANSPLANT_PROJECT_ID")]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy all issues, replaying project field values
    Issues(IssuesArgs),

    /// Copy all pull requests
    Prs(PrsArgs),

    /// Print the project's iteration titles and ids
    Iterations,

    /// Print the ProjectV2 boards linked to a repository
    Projects(ProjectsArgs),

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let source = cli
        .source
        .as_deref()
        .map(str::parse::<RepoRef>)
        .transpose()?;
    let dest = cli.dest.as_deref().map(str::parse::<RepoRef>).transpose()?;

    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        source,
        dest,
        cli.project.clone(),
    )?;

    match cli.command {
        Commands::Issues(args) => args.execute(&config).await?,
        Commands::Prs(args) => args.execute(&config).await?,
        Commands::Iterations => commands::discover::run_iterations(&config).await?,
        Commands::Projects(args) => args.execute(&config).await?,
        Commands::Config => print_config(&config),
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("Transplant configuration");
    println!("========================");
    println!();
    println!("Source:      {}", display_repo(&config.source));
    println!("Destination: {}", display_repo(&config.dest.repo_ref()));
    println!("Default base branch: {}", config.dest.default_base);
    println!();
    if config.project.id.is_empty() {
        println!("Project: (not set)");
    } else {
        println!("Project: {}", config.project.id);
    }
    println!(
        "Iteration mappings: {}",
        config.project.iteration_map.len()
    );
    println!();
    println!(
        "Pacing: retry_base {:?}, retry_limit {}",
        config.pacing.retry_base, config.pacing.retry_limit
    );
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}

fn display_repo(repo: &RepoRef) -> String {
    if repo.is_empty() {
        "(not set)".to_string()
    } else {
        repo.to_string()
    }
}
