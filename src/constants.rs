/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:5000/";

// Timeouts
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const REACHABILITY_TIMEOUT_SECS: u64 = 3;

// Session
pub const FALLBACK_REPLY: &str = "Error fetching response. Please try again later.";
pub const SESSION_COMMAND_BUFFER: usize = 32;
pub const MAX_QUEUED_PROMPTS: usize = 16;

// Offline replies
pub const CANNED_UPPER_BODY_REPLY: &str =
    "Upper body exercises include push-ups, pull-ups, and shoulder presses.";
pub const CANNED_CORE_REPLY: &str = "Core exercises include planks, sit-ups, and Russian twists.";
pub const CANNED_LOWER_BODY_REPLY: &str =
    "Lower body exercises include squats, lunges, and deadlifts.";
pub const CANNED_DEFAULT_PREFIX: &str = "This is a static response to your prompt: ";

// Config
pub const CONFIG_DIR_NAME: &str = "askcoach";
pub const LOCAL_CONFIG_PATH: &str = ".askcoach/config.toml";
pub const ENV_PREFIX: &str = "ASKCOACH_";
