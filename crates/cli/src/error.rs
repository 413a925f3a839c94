//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No access token from flags, environment or config file.
    #[error(
        "PayPal access token not provided: pass --access-token or set PAYPAL_ACCESS_TOKEN"
    )]
    MissingAccessToken,

    /// No tool selection from flags, environment or config file.
    #[error(
        "no tools selected: pass --tools (e.g. --tools=all), set PAYPAL_TOOLS, \
         or add a [tools] table to the config file"
    )]
    MissingTools,

    /// A setting has an invalid value.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),

    /// The MCP server loop failed.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
