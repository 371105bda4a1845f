use std::sync::Arc;
use tracing::info;

use super::canned::CannedDispatcher;
use super::http::HttpDispatcher;
use super::traits::ResponseDispatcher;
use crate::app::Config;
use crate::utils::CoachError;

/// Factory for creating dispatcher instances from configuration
pub struct DispatcherFactory;

impl DispatcherFactory {
    /// Offline mode gets the canned table, everything else the HTTP endpoint
    pub fn create(config: &Config) -> Result<Arc<dyn ResponseDispatcher>, CoachError> {
        if config.endpoint.offline {
            info!("using offline replies");
            return Ok(Arc::new(CannedDispatcher::new()));
        }

        let dispatcher = HttpDispatcher::new(&config.endpoint.url, config.endpoint.timeout())?;
        info!(url = %dispatcher.url(), "using inference endpoint");
        Ok(Arc::new(dispatcher))
    }

    /// Human-readable description of the backend `create` would pick
    pub fn describe(config: &Config) -> String {
        if config.endpoint.offline {
            "offline (built-in replies)".to_string()
        } else {
            config.endpoint.url.clone()
        }
    }
}
