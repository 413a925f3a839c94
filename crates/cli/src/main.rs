mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::Parser;
use mcp::Server;
use runtime::{Dispatcher, Environment, PayPalClient, PayPalToolHost, ToolRegistry, catalog};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides, Settings};
use error::Result;

const CONFIG_FILE: &str = "paypal-mcp.toml";
const LOG_FILTER: &str = "paypal_mcp=info,runtime=info,mcp=info";
const DEBUG_LOG_FILTER: &str = "paypal_mcp=debug,runtime=debug,mcp=debug";

#[derive(Parser)]
#[command(name = "paypal-mcp")]
#[command(about = "PayPal REST API tools over the Model Context Protocol", long_about = None)]
#[command(version)]
struct Cli {
    /// Tools to enable: `all`, or comma-separated names such as
    /// `invoices.create,orders.*`. Falls back to PAYPAL_TOOLS
    #[arg(long)]
    tools: Option<String>,

    /// PayPal OAuth access token. Falls back to PAYPAL_ACCESS_TOKEN
    #[arg(long)]
    access_token: Option<String>,

    /// SANDBOX or PRODUCTION. Falls back to PAYPAL_ENVIRONMENT
    #[arg(long)]
    paypal_environment: Option<String>,

    /// Per-request timeout in seconds. Falls back to PAYPAL_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<String>,

    /// Config file (defaults to ./paypal-mcp.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the tool catalog and exit
    #[arg(long)]
    list_tools: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            tools: self.tools.clone(),
            access_token: self.access_token.clone(),
            environment: self.paypal_environment.clone(),
            timeout_secs: self.timeout_secs.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if cli.list_tools {
        print_catalog();
        return Ok(());
    }

    let file = Config::discover(cli.config.as_deref(), Path::new(CONFIG_FILE))?;
    let env = Overrides::from_env(|name| std::env::var(name).ok());
    let settings = Settings::resolve(&cli.overrides(), &env, file)?;

    let registry = ToolRegistry::from_policy(&settings.tools)?;
    let environment = settings.credentials.environment();

    let mut builder = PayPalClient::builder(settings.credentials).timeout(settings.timeout);
    if let Some(url) = &settings.base_url {
        builder = builder.base_url(url);
    }
    let client = builder.build()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        %environment,
        base_url = %client.base_url(),
        tools = registry.len(),
        "starting PayPal MCP server on stdio"
    );

    let host = PayPalToolHost::new(Dispatcher::new(registry, client))
        .with_instructions(instructions(environment));
    Server::new(host).serve_stdio().await?;

    info!("client disconnected, shutting down");
    Ok(())
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new(DEBUG_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn instructions(environment: Environment) -> String {
    let mut text = format!(
        "Tools for the PayPal {environment} environment. Each call makes one PayPal REST request \
         and returns the JSON response. Errors come back as {{\"error\": {{\"type\", \"message\"}}}}."
    );
    if environment == Environment::Sandbox {
        text.push_str(" Sandbox requests move no real money.");
    }
    text
}

fn print_catalog() {
    println!("{:<28}  {:<32}  {:<6}  PATH", "TOOL", "MCP NAME", "METHOD");
    println!("{}", "-".repeat(100));
    for tool in catalog::all() {
        println!(
            "{:<28}  {:<32}  {:<6}  {}",
            tool.name,
            tool.alias,
            tool.http_method.as_str(),
            tool.path
        );
    }
}
