//! TaskPilot CLI: the main entry point.
//!
//! `taskpilot [OPTIONS] [TASK]...` asks the configured model for a plan,
//! shows it for approval, runs it, and refines it until the operator is
//! satisfied or gives up.

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(
    name = "taskpilot",
    about = "TaskPilot: use AI to automate tasks on your computer",
    version,
    author
)]
pub struct Cli {
    /// The task to perform. Asked for interactively when omitted.
    #[arg(trailing_var_arg = true)]
    task: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (default: ~/.taskpilot/config.toml)
    #[arg(short, long, env = "TASKPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Refinement rounds before giving up (0 = unbounded)
    #[arg(long)]
    max_refinements: Option<u32>,

    /// Override the model provider (gemini, openai, openrouter, ollama, ...)
    #[arg(long)]
    provider: Option<String>,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the operator console.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::run::run(cli).await {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}
