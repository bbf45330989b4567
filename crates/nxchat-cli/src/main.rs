use anyhow::Result;
use clap::{Parser, Subcommand};
use nxchat_infrastructure::NxChatPaths;
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "nxchat")]
#[command(about = "NxChat CLI - headless support chat widget", long_about = None)]
struct Cli {
    /// Keep config, data and logs under this directory instead of the user dirs
    #[arg(long, global = true, env = "NXCHAT_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the tenant's support team from the terminal
    Chat {
        /// Page URL reported as the visitor's current page
        #[arg(long, default_value = "cli://nxchat")]
        page: String,
        /// Page title reported with the page view
        #[arg(long)]
        title: Option<String>,
    },
    /// Print the visitor id for the configured tenant, creating one if needed
    Identity,
    /// Inspect or clear the persisted chat history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print the persisted history
    Show,
    /// Delete the persisted history
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = NxChatPaths::new(cli.home);
    let _log_guard = logging::init(&paths);

    match cli.command {
        Commands::Chat { page, title } => commands::chat::run(&paths, page, title).await?,
        Commands::Identity => commands::identity::run(&paths).await?,
        Commands::History { action } => match action {
            HistoryAction::Show => commands::history::show(&paths).await?,
            HistoryAction::Clear => commands::history::clear(&paths).await?,
        },
    }

    Ok(())
}
