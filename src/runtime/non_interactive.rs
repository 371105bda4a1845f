use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    app::Config,
    cli::OutputFormat,
    dispatch::{DispatcherFactory, ResponseDispatcher},
    session::{SessionController, TurnOutcome},
};

/// Result of a non-interactive run
#[derive(Debug, Serialize, Deserialize)]
pub struct NonInteractiveResult {
    /// The prompt that was sent
    pub prompt: String,
    /// The coach's reply, or the fallback text
    pub response: String,
    /// Whether the fallback text stands in for a reply
    pub fell_back: bool,
    /// Why the dispatch failed, if it did
    pub error: Option<String>,
    /// Metadata about the execution
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Endpoint or offline backend used
    pub backend: String,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

/// Non-interactive runner: one prompt through a fresh session
pub struct NonInteractiveRunner {
    dispatcher: Arc<dyn ResponseDispatcher>,
    backend: String,
    timeout: Duration,
}

impl NonInteractiveRunner {
    /// Create a runner for the configured backend
    pub fn new(config: &Config) -> Result<Self> {
        let dispatcher = DispatcherFactory::create(config)?;
        Ok(Self::with_dispatcher(
            dispatcher,
            DispatcherFactory::describe(config),
            config.endpoint.timeout(),
        ))
    }

    pub fn with_dispatcher(
        dispatcher: Arc<dyn ResponseDispatcher>,
        backend: String,
        timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            backend,
            timeout,
        }
    }

    /// Execute a single prompt and return the result
    pub async fn execute(&self, prompt: String) -> Result<NonInteractiveResult> {
        let start_time = std::time::Instant::now();

        let mut session = SessionController::new(Arc::clone(&self.dispatcher), self.timeout);
        let turn = session.submit(&prompt).await?;

        let response = session
            .state()
            .history()
            .last()
            .map(|m| m.text().to_string())
            .unwrap_or_default();

        let (fell_back, error) = match turn {
            TurnOutcome::Replied => (false, None),
            TurnOutcome::FellBack { reason } => (true, Some(reason.to_string())),
        };

        Ok(NonInteractiveResult {
            prompt,
            response,
            fell_back,
            error,
            metadata: ExecutionMetadata {
                backend: self.backend.clone(),
                duration_ms: start_time.elapsed().as_millis(),
            },
        })
    }

    /// Format the result according to the output format
    pub fn format_result(&self, result: &NonInteractiveResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_else(|e| {
                format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
            }),
            OutputFormat::Text => {
                let mut output = result.response.clone();
                if let Some(error) = &result.error {
                    output.push_str(&format!("\n\n--- Error ---\n{}\n", error));
                }
                output
            }
            OutputFormat::Markdown => {
                let mut output = String::new();

                output.push_str("## Question\n\n");
                output.push_str(&result.prompt);
                output.push_str("\n\n## Coach\n\n");
                output.push_str(&result.response);
                output.push_str("\n\n");

                if let Some(error) = &result.error {
                    output.push_str("## Error\n\n");
                    output.push_str(&format!("- {}\n\n", error));
                }

                output.push_str("---\n");
                output.push_str(&format!(
                    "*Backend: {} | Duration: {}ms*\n",
                    result.metadata.backend, result.metadata.duration_ms
                ));

                output
            }
        }
    }
}
