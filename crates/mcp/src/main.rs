//! Legion MCP Server Binary
//!
//! Entry point for running the Legion MCP server.
//!
//! ## Usage
//!
//! ```bash
//! # Streamable HTTP on 0.0.0.0:8080, MCP endpoint at /mcp
//! legion-mcp
//!
//! # Authenticated backend calls and GitHub tools
//! LEGION_AUTH_TOKEN=... GITHUB_TOKEN=... legion-mcp
//!
//! # Local agent host over stdio
//! legion-mcp --transport stdio
//!
//! # Local backend and a fork's issues
//! legion-mcp --base-url http://localhost:3000 --github-repo acme/legion
//!
//! # Explicit config file and port
//! legion-mcp --config ./legion.toml --port 9090
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use legion_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, TransportMode};
use legion_mcp::LegionMcpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "legion-mcp", version, about = "MCP adapter for the Legion sales platform")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Legion backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// GitHub repository as owner/name
    #[arg(long)]
    github_repo: Option<String>,

    /// Address to bind the HTTP transport to
    #[arg(long)]
    bind: Option<String>,

    /// Port for the HTTP transport
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Host transport: http or stdio
    #[arg(long)]
    transport: Option<TransportMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_options(self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                base_url: self.base_url,
                github_repository: self.github_repo,
                bind_address: self.bind,
                port: self.port,
                transport: self.transport,
                log_level: self.log_level,
            },
        }
    }
}

// Logs go to stderr so the stdio transport keeps stdout for protocol frames.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config and initialize logging before any other operations
    let config = AppConfig::load(cli.load_options())?;
    init_logging(&config);

    info!(
        event_name = "mcp.startup",
        version = env!("CARGO_PKG_VERSION"),
        transport = ?config.server.transport,
        "starting legion mcp"
    );

    let server = LegionMcpServer::from_config(&config)?;
    match config.server.transport {
        TransportMode::Http => server.run_http().await,
        TransportMode::Stdio => server.run_stdio().await,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use legion_core::config::TransportMode;

    use super::Cli;

    #[test]
    fn test_parse_cli_overrides() {
        let cli = Cli::parse_from([
            "legion-mcp",
            "--config",
            "legion.toml",
            "--port",
            "9090",
            "--transport",
            "stdio",
            "--log-level",
            "debug",
        ]);

        let options = cli.load_options();
        assert!(options.require_file);
        assert_eq!(options.overrides.port, Some(9090));
        assert_eq!(options.overrides.transport, Some(TransportMode::Stdio));
        assert_eq!(options.overrides.log_level.as_deref(), Some("debug"));
        assert!(options.overrides.bind_address.is_none());
        assert!(options.overrides.base_url.is_none());
    }

    #[test]
    fn test_parse_backend_and_repository_flags() {
        let options = Cli::parse_from([
            "legion-mcp",
            "--base-url",
            "http://localhost:3000",
            "--github-repo",
            "acme/legion",
        ])
        .load_options();

        assert_eq!(options.overrides.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(options.overrides.github_repository.as_deref(), Some("acme/legion"));
    }

    #[test]
    fn test_defaults_leave_config_optional() {
        let options = Cli::parse_from(["legion-mcp"]).load_options();

        assert!(!options.require_file);
        assert!(options.config_path.is_none());
        assert!(options.overrides.transport.is_none());
    }
}
