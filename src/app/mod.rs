// Gateway module for app - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod config;

// Public re-exports - the ONLY way to access app functionality
pub use config::{
    init_config, load_config, load_config_from, save_config, Config, EndpointConfig,
    SessionConfig, SubmitPolicy, UIConfig,
};
