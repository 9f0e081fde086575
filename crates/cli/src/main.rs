//! tracebank CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Answer one question about one file
//! - `batch`  — Answer every task in a JSON task list
//! - `rules`  — Inspect the reasoning bank
//! - `init`   — Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracebank_core::RunMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "tracebank",
    about = "tracebank — ReAct reasoning agent with a persistent reasoning bank",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.tracebank/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Run {
        #[arg(long)]
        question: String,

        /// Data file, relative to --base-dir
        #[arg(long, default_value = "")]
        file_name: String,

        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        #[arg(long, default_value_t = 1)]
        task_id: u64,

        #[arg(long, default_value_t = 0)]
        run_id: u64,

        /// baseline or enhanced (defaults to the configured mode)
        #[arg(long)]
        mode: Option<RunMode>,

        /// Use the offline mock model
        #[arg(long)]
        mock: bool,

        /// Override the reasoning bank file
        #[arg(long)]
        bank_path: Option<PathBuf>,
    },

    /// Answer every task in a JSON task list
    Batch {
        /// JSON array of {question, file_name}
        #[arg(long)]
        tasks_path: PathBuf,

        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        #[arg(long, default_value_t = 0)]
        run_id: u64,

        #[arg(long)]
        mode: Option<RunMode>,

        #[arg(long)]
        mock: bool,

        #[arg(long)]
        bank_path: Option<PathBuf>,

        /// Where to write the answers (default: answers_<mode>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List rules in the reasoning bank
    Rules {
        #[arg(long)]
        bank_path: Option<PathBuf>,

        /// Rank by overlap with these tags (read-only preview)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Maximum rules to show when ranking
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            question,
            file_name,
            base_dir,
            task_id,
            run_id,
            mode,
            mock,
            bank_path,
        } => {
            let options = commands::AgentOptions { mode, mock, bank_path };
            let task = tracebank_agent::TaskSpec::new(task_id, question, file_name)
                .with_run_id(run_id)
                .with_base_dir(base_dir);
            commands::run::run(config_path, options, task).await?
        }
        Commands::Batch {
            tasks_path,
            base_dir,
            run_id,
            mode,
            mock,
            bank_path,
            output,
        } => {
            let options = commands::AgentOptions { mode, mock, bank_path };
            commands::batch::run(config_path, options, &tasks_path, base_dir, run_id, output).await?
        }
        Commands::Rules {
            bank_path,
            tags,
            limit,
        } => commands::rules::run(config_path, bank_path, tags, limit).await?,
        Commands::Init => commands::init::run(config_path)?,
    }

    Ok(())
}
