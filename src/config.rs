use crate::error::{DashboardError, Result};
use std::path::PathBuf;
use std::time::Duration;

// Constants
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_PATH: &str = "data/climate_data_2000_2024.csv";
pub const DEFAULT_FEEDBACK_PATH: &str = "data/feedback.csv";
pub const DEFAULT_USERS_PATH: &str = "database/users.json";
pub const DEFAULT_FEED_INTERVAL_MS: u64 = 250;
pub const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Which identity provider verifies credentials
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityConfig {
    /// Argon2-hashed users kept in a JSON file next to the app
    Local { users_path: PathBuf },

    /// Firebase Identity Toolkit over REST
    Firebase { api_key: String },
}

/// Runtime configuration of the dashboard
///
/// Every field has a built-in default. Deployment-specific values can be
/// overridden through `CLIMATE_*` environment variables; the identity
/// provider is picked with `CLIMATE_IDENTITY_PROVIDER`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address the web server listens on
    pub bind_addr: String,

    /// CSV file with yearly climate metrics
    pub data_path: PathBuf,

    /// Flat file receiving feedback rows
    pub feedback_path: PathBuf,

    /// Pause between two live feed frames
    pub feed_interval: Duration,

    /// Lifetime of an idle session
    pub session_ttl: Duration,

    pub identity: IdentityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            feedback_path: PathBuf::from(DEFAULT_FEEDBACK_PATH),
            feed_interval: Duration::from_millis(DEFAULT_FEED_INTERVAL_MS),
            session_ttl: Duration::from_secs(SESSION_DURATION),
            identity: IdentityConfig::Local {
                users_path: PathBuf::from(DEFAULT_USERS_PATH),
            },
        }
    }
}

impl Config {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// * Returns `DashboardError::Config` if a numeric value does not parse,
    ///   the provider name is unknown, or Firebase is chosen without an API key
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("CLIMATE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup("CLIMATE_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CLIMATE_FEEDBACK_PATH") {
            config.feedback_path = PathBuf::from(path);
        }
        if let Some(ms) = lookup("CLIMATE_FEED_INTERVAL_MS") {
            config.feed_interval = Duration::from_millis(parse_number("CLIMATE_FEED_INTERVAL_MS", &ms)?);
        }
        if let Some(secs) = lookup("CLIMATE_SESSION_TTL_SECS") {
            config.session_ttl = Duration::from_secs(parse_number("CLIMATE_SESSION_TTL_SECS", &secs)?);
        }

        let users_path = lookup("CLIMATE_USERS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_USERS_PATH));

        let provider = lookup("CLIMATE_IDENTITY_PROVIDER").unwrap_or_else(|| "local".to_string());
        config.identity = match provider.trim().to_ascii_lowercase().as_str() {
            "local" => IdentityConfig::Local { users_path },
            "firebase" => match lookup("FIREBASE_API_KEY") {
                Some(api_key) if !api_key.trim().is_empty() => IdentityConfig::Firebase { api_key },
                _ => {
                    return Err(DashboardError::Config(
                        "FIREBASE_API_KEY must be set when CLIMATE_IDENTITY_PROVIDER=firebase".to_string(),
                    ));
                }
            },
            other => {
                return Err(DashboardError::Config(format!(
                    "unknown identity provider '{}'",
                    other
                )));
            }
        };

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| DashboardError::Config(format!("{} must be a whole number, got '{}'", key, value)))
}
