use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod models;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server for the browser client
    Serve {
        /// Set the server host address
        #[arg(long)]
        host: Option<String>,

        /// Set the server port
        #[arg(long)]
        port: Option<String>,
    },
    /// Start a chat session in the terminal
    Chat {
        /// Model to use in single mode
        #[arg(long)]
        model: Option<String>,

        /// Comma separated models to run as a chain, e.g. "kimi-72b,chimera"
        #[arg(long)]
        chain: Option<String>,

        /// Skip the simulated response delay
        #[arg(long, action, default_value = "false")]
        fast: bool,
    },
    /// List the available models
    Models {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat { model, chain, fast }) => {
            chat::run(model, chain, fast).await?;
        }
        Some(Command::Models {}) => {
            models::run()?;
        }
        None => {}
    }

    Ok(())
}
