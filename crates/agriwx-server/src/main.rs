use std::net::SocketAddr;
use std::sync::Arc;

use agriwx_core::Config;
use agriwx_server::{routes, LookupService};
use anyhow::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Local runs may keep settings in .env
    dotenvy::dotenv().ok();

    agriwx_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Loaded configuration: {:?}", config.openweather);

    let service = Arc::new(LookupService::from_config(&config)?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let (bound, server) = warp::serve(routes(service))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("AgriWx listening on http://{}", bound);
    server.await;

    tracing::info!("AgriWx shut down");
    Ok(())
}
