use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::app::{Config, SubmitPolicy};

#[derive(Parser, Debug)]
#[command(name = "askcoach")]
#[command(version)]
#[command(about = "Ask Coach: chat with your fitness coach from the terminal", long_about = None)]
pub struct Cli {
    /// Inference endpoint receiving the prompts
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Answer from the built-in table instead of the network
    #[arg(long)]
    pub offline: bool,

    /// What to do with input sent while a reply is pending
    #[arg(long, value_enum)]
    pub policy: Option<SubmitPolicy>,

    /// Non-interactive prompt to execute
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.url = endpoint.clone();
        }
        if let Some(timeout) = self.timeout {
            config.endpoint.timeout_secs = timeout;
        }
        if self.offline {
            config.endpoint.offline = true;
        }
        if let Some(policy) = self.policy {
            config.session.submit_policy = policy;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Start a chat session (default)
    Chat,
    /// List the quick-select topics
    Topics,
    /// Show configuration and endpoint status
    Status,
    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
    /// Markdown formatted output
    Markdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_config() {
        let cli = Cli::parse_from([
            "askcoach",
            "--endpoint",
            "http://coach.example:8080/",
            "--timeout",
            "7",
            "--policy",
            "queue",
            "--offline",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.endpoint.url, "http://coach.example:8080/");
        assert_eq!(config.endpoint.timeout_secs, 7);
        assert!(config.endpoint.offline);
        assert_eq!(config.session.submit_policy, SubmitPolicy::Queue);
    }

    #[test]
    fn test_no_flags_leave_config_alone() {
        let cli = Cli::parse_from(["askcoach", "chat"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
        assert!(matches!(cli.command, Some(Commands::Chat)));
    }

    #[test]
    fn test_output_format_requires_prompt() {
        assert!(Cli::try_parse_from(["askcoach", "--output-format", "json"]).is_err());
        let cli = Cli::try_parse_from(["askcoach", "-p", "Core", "--output-format", "json"]).unwrap();
        assert!(matches!(cli.output_format, OutputFormat::Json));
    }
}
