//! cbtprep CLI — timed multiple-choice practice exams in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cbtprep", version, about = "Timed multiple-choice practice exams")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and a sample question bank
    Init,

    /// Check a question bank for problems
    Validate {
        /// Bank file or http(s) URL (overrides the configured source)
        #[arg(long)]
        bank: Option<String>,
    },

    /// Save the profile used for exams and history
    Login {
        /// Display name
        #[arg(long)]
        name: String,

        /// Department
        #[arg(long)]
        department: String,
    },

    /// Show the saved profile
    Whoami,

    /// Take a timed exam
    Take {
        /// Bank file or http(s) URL (overrides the configured source)
        #[arg(long)]
        bank: Option<String>,

        /// Seed for question selection, for reproducible exams
        #[arg(long)]
        seed: Option<u64>,

        /// Print the answer review after submitting
        #[arg(long)]
        review: bool,
    },

    /// Show past results
    History {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cbtprep=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { bank } => commands::validate::execute(bank, config).await,
        Commands::Login { name, department } => {
            commands::login::execute(&name, &department, config)
        }
        Commands::Whoami => commands::login::whoami(config),
        Commands::Take { bank, seed, review } => {
            commands::take::execute(bank, seed, review, config).await
        }
        Commands::History { json } => commands::history::execute(json, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
