//! Host entry point.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use aegis_config::{ConfigSource, HostEnvironment};
use aegis_host::{Server, Startup};

fn init_tracing(environment: HostEnvironment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if environment.is_development() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let source = match std::env::args().nth(1) {
        Some(path) => ConfigSource::from_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => ConfigSource::empty(),
    }
    .with_env_overrides();

    let startup = Startup::new(source).context("binding configuration")?;
    init_tracing(startup.environment());
    tracing::info!(environment = ?startup.environment(), "starting aegis");

    // Startup failures are operator errors; exit before the listener
    // ever opens.
    let container = startup
        .configure_services()
        .context("registering capabilities")?;
    let pipeline = startup
        .build_pipeline(&container)
        .context("assembling pipeline")?;

    let addr = startup.http_addr().context("reading bind address")?;
    Server::new(addr, pipeline).run().await.context("serving")?;

    Ok(())
}
