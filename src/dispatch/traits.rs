use async_trait::async_trait;

use super::types::{DispatchOutcome, Prompt};

/// Core trait that every inference backend must implement
///
/// One call sends one prompt and resolves once. Implementations keep no state
/// between calls and never retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseDispatcher: Send + Sync {
    /// Send the prompt and wait for the reply or the failure
    async fn send(&self, prompt: &Prompt) -> DispatchOutcome;

    /// Best-effort check that the backend can be reached
    async fn is_reachable(&self) -> bool {
        true
    }
}
