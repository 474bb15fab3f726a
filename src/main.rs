//! `vix-guest-tools` binary: serves the guest tools to an MCP client on
//! stdin/stdout.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use vix_guest_tools::config::{self, VixToolsConfig};
use vix_guest_tools::guest::GuestContext;
use vix_guest_tools::logging::{init_logging, LogLevel};
use vix_guest_tools::server::GuestToolServer;
use vix_guest_tools::tools::{GuestTools, ToolRegistry};
use vix_guest_tools::vix::{StubVix, VixBackend};

/// Which VIX implementation to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// VMware's libvixAllProducts
    Native,
    /// In-memory simulation for dry runs
    Stub,
}

/// Run shell commands inside VMware guests over the Model Context Protocol.
#[derive(Debug, Parser)]
#[command(name = "vix-guest-tools", version, about)]
struct Cli {
    /// Configuration file (default: search ./vix-guest-tools.toml, then the XDG config dir)
    #[arg(long, env = "VIX_GUEST_TOOLS_CONFIG")]
    config: Option<PathBuf>,

    /// VIX backend
    #[arg(long, value_enum, default_value_t = Backend::Native)]
    backend: Backend,

    /// Log level when RUST_LOG is not set
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Print the tool definitions as JSON and exit
    #[arg(long)]
    list_tools: bool,
}

fn load_config(cli: &Cli) -> Result<VixToolsConfig> {
    let mut config = match &cli.config {
        Some(path) => config::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => config::load().context("loading configuration")?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    Ok(config)
}

#[cfg(feature = "native")]
fn native_backend() -> Result<Arc<dyn VixBackend>> {
    Ok(Arc::new(vix_guest_tools::vix::NativeVix::new()))
}

#[cfg(not(feature = "native"))]
fn native_backend() -> Result<Arc<dyn VixBackend>> {
    anyhow::bail!(
        "the native VIX backend is not compiled in; rebuild with `--features native` \
         or run with `--backend stub`"
    )
}

fn build_registry(backend: Arc<dyn VixBackend>, config: VixToolsConfig) -> Result<ToolRegistry> {
    let ctx = Arc::new(GuestContext::new(backend, config));
    let mut registry = ToolRegistry::new();
    GuestTools::all(ctx)
        .register_into(&mut registry)
        .context("registering guest tools")?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.list_tools {
        let registry = build_registry(Arc::new(StubVix::new()), config)?;
        let tools = serde_json::to_string_pretty(&registry.list())?;
        println!("{tools}");
        return Ok(());
    }

    let _guard = init_logging(&config.logging).context("initializing logging")?;

    let backend = match cli.backend {
        Backend::Native => native_backend()?,
        Backend::Stub => {
            tracing::warn!("Using the stub VIX backend; no real VM will be touched");
            Arc::new(StubVix::new()) as Arc<dyn VixBackend>
        }
    };

    let registry = build_registry(backend, config)?;
    GuestToolServer::new(Arc::new(registry))
        .serve_stdio()
        .await
        .context("serving MCP on stdio")?;

    Ok(())
}
