//! quizforge CLI: turn documents into multiple-choice quizzes and score them.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizforge",
    version,
    about = "Turn documents into multiple-choice quizzes"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build quizzes from documents and store them
    Upload {
        /// PDF or text files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Quiz title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,

        /// Max concurrent uploads
        #[arg(long)]
        parallelism: Option<usize>,
    },

    /// Show what the pipeline sees in a document, without generating or storing
    Inspect {
        /// PDF or text file
        file: PathBuf,
    },

    /// Print a stored quiz
    Show {
        /// Quiz id
        id: String,
    },

    /// List stored quizzes
    List,

    /// Score answers against a stored quiz
    Score {
        /// Quiz id
        id: String,

        /// Comma-separated answers in question order, e.g. "A,b,,D"
        #[arg(long)]
        answers: String,

        /// Send the score notice to this address
        #[arg(long)]
        email: Option<String>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Upload {
            files,
            title,
            parallelism,
        } => commands::upload::execute(files, title, parallelism, config).await,
        Commands::Inspect { file } => commands::inspect::execute(file, config),
        Commands::Show { id } => commands::show::execute(id, config).await,
        Commands::List => commands::list::execute(config).await,
        Commands::Score { id, answers, email } => {
            commands::score::execute(id, answers, email, config).await
        }
        Commands::ListModels { provider } => commands::list_models::execute(provider, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
