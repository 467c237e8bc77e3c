//! convo - hosted video conversations from the terminal
//!
//! Creates a conversation on the Conversation API, opens its call and ends
//! it again, with a few maintenance commands around that lifecycle.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};
use convo_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let directive = if cli.verbose {
        "convo=debug,convo_core=debug"
    } else {
        "convo=info,convo_core=info"
    };
    let mut filter = EnvFilter::from_default_env();
    for d in directive.split(',') {
        filter = filter.add_directive(d.parse()?);
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load configuration
    let config = Config::load()?;

    // Execute command
    match cli.command {
        Commands::Run => commands::run::execute(&config).await,
        Commands::Create { no_cleanup } => commands::create::execute(no_cleanup, &config).await,
        Commands::List { json } => commands::conversations::list(json, &config).await,
        Commands::End { conversation_id } => {
            commands::conversations::end(&conversation_id, &config).await
        }
        Commands::Cleanup => commands::conversations::cleanup(&config).await,
        Commands::Config(cmd) => commands::config::execute(cmd, &config),
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("convo {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
