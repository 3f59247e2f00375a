use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sdlc_toolbox_core::Environment;
use sdlc_toolbox_mcp::server::McpServer;
use sdlc_toolbox_mcp::sse::serve_sse;
use sdlc_toolbox_mcp::stdio::serve_stdio;
use sdlc_toolbox_mcp::tools::{build_registry, BuildOptions, ServerKind, TransportKind};

#[derive(Parser)]
#[command(name = "sdlc-toolbox-mcp")]
#[command(version)]
#[command(about = "Serve one SDLC tool server over MCP")]
struct Args {
    #[arg(value_enum, env = "SDLC_TOOLBOX_SERVER", help = "Tool server to run")]
    server: ServerKind,
    #[arg(
        short,
        long,
        value_enum,
        env = "MCP_TRANSPORT",
        help = "Transport [default: sse for insights and devops, stdio otherwise]"
    )]
    transport: Option<TransportKind>,
    #[arg(long, env = "MCP_HOST", default_value = "127.0.0.1", help = "SSE bind address")]
    host: IpAddr,
    #[arg(
        short,
        long,
        env = "MCP_PORT",
        help = "SSE port [default: 8081 for devops, 8080 otherwise]"
    )]
    port: Option<u16>,
    #[arg(long, env = "SDLC_TEMPLATES_DIR", help = "Directory holding the template files")]
    templates_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // .env first so it can also carry RUST_LOG and the flags' env fallbacks.
    let env = Environment::from_process();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let transport = args
        .transport
        .unwrap_or_else(|| args.server.default_transport());

    let options = BuildOptions {
        templates_dir: args.templates_dir,
    };
    let registry = build_registry(args.server, &env, &options)
        .with_context(|| format!("cannot start the {} server", args.server.server_name()))?;
    let registry = Arc::new(registry);

    tracing::info!(
        server = registry.name(),
        %transport,
        "starting"
    );

    match transport {
        TransportKind::Stdio => {
            let mut server = McpServer::new(registry);
            serve_stdio(&mut server, io::stdin().lock(), io::stdout().lock())?;
        }
        TransportKind::Sse => {
            let addr = SocketAddr::new(args.host, args.port.unwrap_or(args.server.default_port()));
            // Declared after `registry`, so the runtime is gone before the
            // blocking HTTP clients are dropped.
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(serve_sse(registry.clone(), addr))?;
        }
    }

    Ok(())
}
