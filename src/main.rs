use clap::Parser;

use bot_proxy::config::{loader, Args};
use bot_proxy::lifecycle::signals;
use bot_proxy::net::Listener;
use bot_proxy::observability;
use bot_proxy::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = loader::resolve(&args)?;

    observability::init_logging(&config.observability);

    tracing::info!("bot-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        upstream = %config.upstream.base_url,
        "Configuration loaded"
    );
    tracing::info!("Key validation enabled");

    let listener = Listener::bind(&config.listener).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
