//! Ollabot CLI - terminal chat front-end for a local Ollama server.

use clap::{Parser, Subcommand};
use ollabot_chat::ChatConfig;

mod commands;
mod logging;

/// Ollabot - chat with a local model, with automatic health checks
#[derive(Parser)]
#[command(name = "ollabot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend URL (overrides OLLABOT_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Model name (overrides OLLABOT_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,

    /// Send a single prompt and print the reply
    Ask {
        /// Prompt text
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Check that the backend is running and the model works
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restart the backend service
    Restart,

    /// Check installation, connectivity and installed models
    Diagnose,

    /// List installed models
    Models,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let mut config = ChatConfig::from_env();
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    logging::init(cli.verbose, config.log_file.as_deref());
    tracing::debug!("Using {} at {}", config.model, config.base_url);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => runtime.block_on(commands::chat::run(&config)),
        Commands::Ask { prompt } => runtime.block_on(commands::ask::run(&config, &prompt.join(" "))),
        Commands::Status { json } => runtime.block_on(commands::status::run(&config, json)),
        Commands::Restart => runtime.block_on(commands::restart::run(&config)),
        Commands::Diagnose => runtime.block_on(commands::diagnose::run(&config)),
        Commands::Models => runtime.block_on(commands::models::run(&config)),
    }
}
