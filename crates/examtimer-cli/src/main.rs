//! examtimer CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examtimer_core::model::Mode;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "examtimer", version, about = "Timed exam and practice simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive exam or practice session
    Run {
        /// Session mode: exam or practice
        #[arg(long, default_value = "exam")]
        mode: Mode,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory to write the finished report into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all (comma-separated)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Score a saved report against an answer key
    Score {
        /// Report JSON written by `run`
        #[arg(long)]
        report: PathBuf,

        /// Answer-key TOML file
        #[arg(long)]
        answer_key: PathBuf,

        /// Output format: text, markdown, html, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the scored report back to this JSON file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Validate an answer-key TOML file
    Validate {
        /// Answer-key TOML file
        #[arg(long)]
        answer_key: PathBuf,

        /// Also check the key against a saved report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Evaluate an arithmetic expression with the scratch calculator
    Calc {
        /// Expression using 0-9 + - * / ( ) .
        #[arg(required = true, allow_hyphen_values = true)]
        expression: Vec<String>,
    },

    /// Create a starter config and an example answer key
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examtimer=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            mode,
            config,
            output,
            format,
        } => commands::run::execute(mode, config, output, format).await,
        Commands::Score {
            report,
            answer_key,
            format,
            save,
        } => commands::score::execute(report, answer_key, format, save),
        Commands::Validate { answer_key, report } => {
            commands::validate::execute(answer_key, report)
        }
        Commands::Calc { expression } => commands::calc::execute(expression),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
