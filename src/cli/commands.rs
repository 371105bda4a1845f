use anyhow::Result;
use colored::Colorize;

use crate::{
    app::{init_config, Config},
    dispatch::DispatcherFactory,
    session::QuickIntent,
};

use super::Commands;

/// Handle CLI subcommands; `Ok(true)` means nothing is left to do
pub async fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing Ask Coach configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::Topics => {
            list_topics();
            Ok(true)
        }
        Commands::Status => {
            show_status(config).await?;
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat interface
    }
}

/// List quick-select topics with their shortcuts
pub fn list_topics() {
    println!("Quick-select topics:");
    for (index, intent) in QuickIntent::ALL.iter().enumerate() {
        println!("  /{}  {}", index + 1, intent.label().green());
    }
}

/// Show version information
pub fn show_version() {
    println!("Ask Coach v{}", env!("CARGO_PKG_VERSION"));
    println!("   Your fitness coach, in the terminal");
}

/// Show the effective configuration and whether the endpoint answers
async fn show_status(config: &Config) -> Result<()> {
    println!("Ask Coach Status:");
    println!();

    println!("  Backend:        {}", DispatcherFactory::describe(config));
    println!("  Timeout:        {}s", config.endpoint.timeout_secs);
    println!("  Submit policy:  {:?}", config.session.submit_policy);

    let dispatcher = DispatcherFactory::create(config)?;
    if dispatcher.is_reachable().await {
        println!("  [OK] Endpoint reachable");
    } else {
        println!("  [ERROR] Endpoint not reachable");
        println!("     Replies will fall back until the service is up, or use --offline");
    }

    Ok(())
}
