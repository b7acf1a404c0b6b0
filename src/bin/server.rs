//! Toolwire MCP Server
//!
//! Run with: toolwire-server

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toolwire::error::Result;
use toolwire::mcp::SessionEnd;
use toolwire::{build_context, Dispatcher, LogFormat, McpServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "toolwire-server")]
#[command(about = "Toolwire MCP server exposing tools and prompts over stdio")]
#[command(version)]
struct Args {
    /// Server name reported to clients
    #[arg(long, env = "TOOLWIRE_SERVER_NAME", default_value = "toolwire")]
    name: String,

    /// Log every dispatched message
    #[arg(short, long, env = "TOOLWIRE_VERBOSE")]
    verbose: bool,

    /// Log format on stderr (text or json)
    #[arg(long, env = "TOOLWIRE_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Default worker count for batch tools
    #[arg(long, env = "TOOLWIRE_MAX_CONCURRENCY", default_value = "4")]
    max_concurrency: usize,

    /// Bundled tools to leave out (comma-separated)
    #[arg(long, env = "TOOLWIRE_DISABLE_TOOLS", value_delimiter = ',')]
    disable_tools: Vec<String>,

    /// Usage hints returned from initialize
    #[arg(long, env = "TOOLWIRE_INSTRUCTIONS")]
    instructions: Option<String>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            server_name: args.name,
            verbose: args.verbose,
            log_format: args.log_format,
            max_concurrency: args.max_concurrency,
            disabled_tools: args
                .disable_tools
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            instructions: args.instructions,
            ..ServerConfig::default()
        }
    }
}

fn init_logging(config: &ServerConfig) {
    // Logs go to stderr; stdout carries only protocol lines
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from(Args::parse());
    init_logging(&config);
    config.validate()?;

    let context = build_context(&config);
    tracing::info!(
        name = %context.info.name,
        version = %context.info.version,
        tools = context.tools.len(),
        prompts = context.prompts.len(),
        "Toolwire MCP server starting..."
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut server = McpServer::new(Dispatcher::new(context));
    match server.run_stdio(shutdown_rx).await {
        Ok(SessionEnd::Eof) => tracing::info!("Client disconnected"),
        Ok(SessionEnd::Cancelled) => tracing::info!("Session cancelled"),
        Err(e) => {
            tracing::error!("Session failed: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
