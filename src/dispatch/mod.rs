// Gateway module for dispatch - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod canned;
mod factory;
mod http;
mod traits;
mod types;

// Public re-exports - the ONLY way to access dispatch functionality
pub use canned::CannedDispatcher;
pub use factory::DispatcherFactory;
pub use http::HttpDispatcher;
pub use traits::ResponseDispatcher;
pub use types::{DispatchFailure, DispatchOutcome, Prompt, Reply};

#[cfg(test)]
pub use traits::MockResponseDispatcher;
