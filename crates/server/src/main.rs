use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tilescope::{Config, Engine};
use tilescope_server::{ServerOptions, load_engine_config, spawn_services};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Newline-delimited JSON file of listings to load at startup
    #[arg(short, long)]
    listings: Option<PathBuf>,

    /// Engine configuration (JSON, or TOML with a .toml extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between aggregate refreshes; 0 disables the refresher
    #[arg(long, default_value_t = 30)]
    refresh_secs: u64,

    /// Also serve the REST API on this port
    #[cfg(feature = "http")]
    #[arg(long)]
    http_port: Option<u16>,
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl_c signal: {}", e);
        futures::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilescope_server=info,tilescope=info,info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading engine config from {}", path.display());
            load_engine_config(path)?
        }
        None => Config::default(),
    };

    let mut builder = Engine::builder().config(config);
    if let Some(path) = &args.listings {
        info!("Loading listings from {}", path.display());
        builder = builder.listings_file(path);
    }
    let engine = Arc::new(builder.build()?);
    info!("Engine ready with {} listings", engine.len());

    let mut options = ServerOptions::default();
    if args.refresh_secs > 0 {
        options = options.with_refresh_interval(Duration::from_secs(args.refresh_secs));
    }
    let handler = spawn_services(engine.clone(), &options);

    #[cfg(feature = "http")]
    if let Some(http_port) = args.http_port {
        let addr: SocketAddr = format!("{}:{}", args.host, http_port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let http_handler = handler.clone();
        tokio::spawn(async move {
            if let Err(e) =
                tilescope_server::transport::http::serve(listener, http_handler, ctrl_c()).await
            {
                tracing::error!("HTTP server failed: {}", e);
            }
        });
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tilescope_server::transport::rpc::serve(listener, handler, Box::pin(ctrl_c())).await?;

    engine.close();
    Ok(())
}
