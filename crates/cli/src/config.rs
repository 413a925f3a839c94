//! Configuration loading from paypal-mcp.toml and the environment.

use policy::ToolPolicy;
use runtime::{Credentials, DEFAULT_TIMEOUT, Environment};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Contents of the TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paypal: PayPalConfig,

    /// Tool selection (allow/deny).
    pub tools: Option<ToolPolicy>,
}

/// `[paypal]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayPalConfig {
    pub environment: Option<String>,
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Overrides the environment's API host.
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `explicit` if given, else `fallback` if it exists, else nothing.
    pub fn discover(explicit: Option<&Path>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if fallback.exists() => Self::load(fallback),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Values from one source (flags or environment). Unset fields fall through
/// to the next source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub tools: Option<String>,
    pub access_token: Option<String>,
    pub environment: Option<String>,
    pub timeout_secs: Option<String>,
}

impl Overrides {
    /// Read `PAYPAL_*` variables through `lookup`.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            tools: var("PAYPAL_TOOLS"),
            access_token: var("PAYPAL_ACCESS_TOKEN"),
            environment: var("PAYPAL_ENVIRONMENT"),
            timeout_secs: var("PAYPAL_TIMEOUT_SECS"),
        }
    }
}

/// Fully resolved server settings.
#[derive(Debug)]
pub struct Settings {
    pub tools: ToolPolicy,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub base_url: Option<String>,
}

impl Settings {
    /// Merge sources, highest precedence first: flags, environment, file.
    ///
    /// A `--tools` list (from flags or environment) replaces the file's
    /// `[tools]` table entirely.
    pub fn resolve(flags: &Overrides, env: &Overrides, file: Config) -> Result<Self> {
        let tools = match flags.tools.as_deref().or(env.tools.as_deref()) {
            Some(list) => ToolPolicy::from_list(list)?,
            None => file.tools.ok_or(Error::MissingTools)?,
        };

        let access_token = flags
            .access_token
            .clone()
            .or_else(|| env.access_token.clone())
            .or(file.paypal.access_token)
            .ok_or(Error::MissingAccessToken)?;

        let environment = match flags
            .environment
            .as_deref()
            .or(env.environment.as_deref())
            .or(file.paypal.environment.as_deref())
        {
            Some(name) => name.parse::<Environment>()?,
            None => Environment::default(),
        };

        let timeout = match flags.timeout_secs.as_deref().or(env.timeout_secs.as_deref()) {
            Some(raw) => parse_timeout(raw)?,
            None => file
                .paypal
                .timeout_secs
                .map(seconds)
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        Ok(Self {
            tools,
            credentials: Credentials::new(access_token, environment)?,
            timeout,
            base_url: file.paypal.base_url,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs = raw
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid timeout: {raw}")))?;
    seconds(secs)
}

fn seconds(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Config("timeout must be at least 1 second".to_string()));
    }
    Ok(Duration::from_secs(secs))
}
