use anyhow::Result;
use clap::Parser;

use askcoach::{
    cli::Cli,
    runtime::{NonInteractiveRunner, Orchestrator},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    // Check if running in non-interactive mode
    if let Some(prompt) = cli.prompt.clone() {
        run_non_interactive(cli, prompt).await
    } else {
        let orchestrator = Orchestrator::new(cli)?;
        orchestrator.run().await
    }
}

/// Run in non-interactive mode
async fn run_non_interactive(cli: Cli, prompt: String) -> Result<()> {
    let config = Orchestrator::load_config(&cli)?;

    let runner = NonInteractiveRunner::new(&config)?;
    let result = runner.execute(prompt).await?;

    println!("{}", runner.format_result(&result, cli.output_format));

    // Exit with appropriate code
    if result.fell_back {
        std::process::exit(1);
    }

    Ok(())
}
