use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_ENDPOINT_URL, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_PREFIX,
    LOCAL_CONFIG_PATH,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Inference endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Session behaviour
    #[serde(default)]
    pub session: SessionConfig,

    /// Terminal presentation
    #[serde(default)]
    pub ui: UIConfig,
}

/// Where and how prompts are dispatched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL receiving `POST {"prompt": ...}`
    pub url: String,
    /// Upper bound for a single request, in seconds
    pub timeout_secs: u64,
    /// Answer from the built-in table instead of the network
    pub offline: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT_URL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            offline: false,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// What happens to a submission made while a reply is still outstanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubmitPolicy {
    /// Refuse it; the user resubmits once the reply is in
    #[default]
    Reject,
    /// Hold it and send it after the current turn completes
    Queue,
}

/// Session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub submit_policy: SubmitPolicy,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIConfig {
    /// Prefix messages with their time
    pub show_timestamps: bool,
    /// Colourise terminal output
    pub color: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            color: true,
        }
    }
}

/// Load configuration from the default sources
pub fn load_config() -> Result<Config> {
    load_config_from(None)
}

/// Load configuration, layering an explicit file over the default sources
///
/// Order (later wins): defaults, global config, project config, `explicit`,
/// `ASKCOACH_` environment variables.
pub fn load_config_from(explicit: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(global_config) = global_config_path() {
        if global_config.exists() {
            figment = figment.merge(Toml::file(&global_config));
        }
    }

    let local_config = PathBuf::from(LOCAL_CONFIG_PATH);
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        figment = figment.merge(Toml::file(path));
    }

    // ASKCOACH_ENDPOINT__URL -> endpoint.url
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Path of the global config file, without touching the filesystem
fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", CONFIG_DIR_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Get the configuration directory, creating it if needed
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", CONFIG_DIR_NAME) {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    }

    let local_example = PathBuf::from(format!("{}.example", LOCAL_CONFIG_PATH));
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let example_config = r#"# Ask Coach project configuration
# Copy to .askcoach/config.toml to override global settings here

[endpoint]
url = "http://localhost:5000/"
timeout_secs = 30
offline = false

[session]
# "reject" refuses input while a reply is pending, "queue" sends it afterwards
submit_policy = "reject"

[ui]
show_timestamps = true
color = true
"#;
        std::fs::write(&local_example, example_config)?;
        println!("Created example configuration at: {}", local_example.display());
    }

    Ok(())
}
