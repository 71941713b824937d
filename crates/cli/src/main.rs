//! PHILOVOID CLI — the main entry point.
//!
//! Commands:
//! - `init` — Write a starter configuration
//! - `ask`  — Send a single message and stream the response
//! - `chat` — Interactive session: conversation, knowledge library,
//!   synthesis desk, and the ritual stage cycle

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "philovoid",
    about = "PHILOVOID — a recursive ontological chat companion",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init,

    /// Send a single message and stream the response
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// Use the deep model with extended reasoning
        #[arg(long)]
        deep: bool,
    },

    /// Enter the interactive session
    Chat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run()?,
        Commands::Ask { message, deep } => commands::ask::run(&message, deep).await?,
        Commands::Chat => commands::chat::run().await?,
    }

    Ok(())
}
