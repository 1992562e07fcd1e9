//! mockrpc command line: serve or check a fixture/script directory.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mockrpc::{ActionHandler, MockServer, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mockrpc")]
#[command(author, version, about = "Mock JSON-RPC endpoint for testing RPC clients", long_about = None)]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the endpoint and serve until Ctrl-C
    Serve(SourceArgs),
    /// Load fixtures and scripts and list the routed actions
    Check(SourceArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// YAML configuration file
    #[arg(short, long, env = "MOCKRPC_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "MOCKRPC_HOST")]
    host: Option<String>,

    #[arg(short, long, env = "MOCKRPC_PORT")]
    port: Option<u16>,

    /// Fixture directory
    #[arg(short, long, env = "MOCKRPC_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Script handler directory
    #[arg(short, long, env = "MOCKRPC_SCRIPTS")]
    scripts: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
    };
}

impl SourceArgs {
    /// File configuration with command line overrides applied.
    fn load(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = ServerConfig::from_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?;
                if let Some(base) = path.parent() {
                    config.resolve_paths(base);
                }
                config
            }
            None => ServerConfig::default(),
        };

        if let Some(host) = &self.host {
            config.listen.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listen.port = Some(port);
        }
        if let Some(dir) = &self.fixtures {
            config.fixtures = Some(dir.clone());
        }
        if let Some(dir) = &self.scripts {
            config.scripts = Some(dir.clone());
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn serve(args: &SourceArgs) -> Result<()> {
    let config = args.load()?;
    let dispatcher = config
        .definition()
        .context("Failed to load server definition")?
        .build();
    if dispatcher.is_empty() {
        tracing::warn!("No fixtures or scripts loaded; every call will be answered with Method not found");
    }

    let mut server = MockServer::new(dispatcher, config.listen.clone());
    server.start().context("Failed to start server")?;
    if let Some(url) = server.url() {
        println!("mockrpc serving on {url}");
    }

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?
        .block_on(tokio::signal::ctrl_c())
        .context("Failed to wait for Ctrl-C")?;

    server.stop();
    Ok(())
}

fn check(args: &SourceArgs) -> Result<()> {
    let config = args.load()?;
    let dispatcher = config
        .definition()
        .context("Failed to load server definition")?
        .build();

    for action in dispatcher.actions() {
        match dispatcher.route(action) {
            Some(ActionHandler::Fixture(fixture)) => {
                println!("{action}\tfixture\t{} entries", fixture.valid_requests.len());
            }
            Some(handler) => println!("{action}\t{}", handler.kind()),
            None => {}
        }
    }
    println!("{} actions", dispatcher.len());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    match &cli.command {
        Command::Serve(args) => serve(args),
        Command::Check(args) => check(args),
    }
}
