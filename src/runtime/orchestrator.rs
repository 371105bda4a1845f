use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::debug;

use crate::{
    app::{load_config_from, Config, UIConfig},
    cli::{handle_command, list_topics, Cli},
    dispatch::DispatcherFactory,
    session::{
        Accepted, Message, QuickIntent, SessionController, SessionHandle, SubmitError,
        ViewReceiver,
    },
};

/// Main runtime orchestrator for the interactive chat
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = Self::load_config(&cli)?;
        Ok(Self { cli, config })
    }

    /// Configuration files and environment, then command-line overrides
    pub fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = match load_config_from(cli.config.as_deref()) {
            Ok(cfg) => cfg,
            // An explicit --config must load; otherwise fall back to defaults
            Err(e) if cli.config.is_some() => return Err(e),
            Err(e) => {
                eprintln!("⚠️  Failed to load config: {}. Using defaults.", e);
                Config::default()
            }
        };
        cli.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        // Handle subcommands
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config).await? {
                return Ok(()); // Command handled, exit
            }
        }

        if !self.config.ui.color {
            colored::control::set_override(false);
        }

        let dispatcher = DispatcherFactory::create(&self.config)?;
        println!(
            "💪 Ask Coach is ready ({})",
            DispatcherFactory::describe(&self.config).green()
        );
        print_help();

        let controller = SessionController::new(dispatcher, self.config.endpoint.timeout());
        let session = SessionHandle::spawn(controller, self.config.session.submit_policy);
        let renderer = tokio::spawn(render_updates(session.subscribe(), self.config.ui.clone()));

        let end = read_input(BufReader::new(tokio::io::stdin()), &session).await?;
        end.close(session).await;
        renderer.await?;

        println!("👋 See you at the next workout!");
        Ok(())
    }
}

/// How the input loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputEnd {
    Quit,
    Eof,
}

impl InputEnd {
    /// `/quit` leaves at once; end of input lets outstanding replies land first
    async fn close(self, session: SessionHandle) {
        match self {
            Self::Quit => {
                debug!("quit requested; abandoning outstanding replies");
                session.close().await;
            }
            Self::Eof => {
                debug!("input closed; waiting for outstanding replies");
                session.close_when_idle().await;
            }
        }
    }
}

/// Feed terminal lines into the session until `/quit` or end of input
async fn read_input<R>(input: R, session: &SessionHandle) -> Result<InputEnd>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LinesStream::new(input.lines());
    while let Some(line) = lines.next().await {
        let line = line?;
        match InputCommand::parse(&line) {
            InputCommand::Quit => return Ok(InputEnd::Quit),
            InputCommand::Help => print_help(),
            InputCommand::Topics => list_topics(),
            InputCommand::Select(intent) => report(session.select(intent).await),
            InputCommand::Text(text) => report(session.submit(text).await),
            InputCommand::Unknown(command) => {
                println!("{} unknown command /{} (try /help)", "?".yellow(), command)
            }
        }
    }
    Ok(InputEnd::Eof)
}

/// One line of terminal input
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputCommand {
    Text(String),
    Select(QuickIntent),
    Topics,
    Help,
    Quit,
    Unknown(String),
}

impl InputCommand {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Text(line.to_string());
        };

        match command.to_lowercase().as_str() {
            "quit" | "exit" | "q" => Self::Quit,
            "help" | "?" => Self::Help,
            "topics" => Self::Topics,
            other => match QuickIntent::from_shortcut(other) {
                Some(intent) => Self::Select(intent),
                None => Self::Unknown(command.to_string()),
            },
        }
    }
}

fn print_help() {
    println!();
    println!("Type a question and press Enter, or pick a topic:");
    for (index, intent) in QuickIntent::ALL.iter().enumerate() {
        println!("  /{}  {}", index + 1, intent.label());
    }
    println!("  /topics  /help  /quit");
    println!();
}

/// Tell the user about submissions that did not start a turn right away
fn report(result: Result<Accepted, SubmitError>) {
    match result {
        Ok(Accepted::Started) | Err(SubmitError::EmptyPrompt) => {}
        Ok(Accepted::Queued { position }) => {
            println!("{} queued (#{})", "⏳".dimmed(), position);
        }
        Err(SubmitError::Busy) => {
            println!(
                "{} Coach is still answering; send that again in a moment.",
                "⏳".yellow()
            );
        }
        Err(e) => println!("{} {}", "❌".red(), e),
    }
}

/// Print assistant turns as they land; returns when the session closes
async fn render_updates(mut view: ViewReceiver, ui: UIConfig) {
    while let Some(update) = view.changed().await {
        for message in update.new_messages.iter().filter(|m| !m.is_user()) {
            println!("{}", format_reply(message, &ui));
        }
        if update.pending && update.scroll_to_latest {
            println!("{}", "Coach is typing...".dimmed());
        }
    }
}

fn format_reply(message: &Message, ui: &UIConfig) -> String {
    let speaker = "[Coach]".cyan().bold();
    if ui.show_timestamps {
        format!(
            "{} {} {}",
            message.created_at().format("%H:%M").to_string().dimmed(),
            speaker,
            message.text()
        )
    } else {
        format!("{} {}", speaker, message.text())
    }
}
