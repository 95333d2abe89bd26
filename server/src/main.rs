use labsense_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = ServerConfig::from_env()?;
    let store = config.open_store();

    info!("LABSense webhook starting");
    info!("  Store: {} ({:?})", store.name(), config.store);
    info!("  Reply format: {}", config.reply_format);
    info!("  UTC offset: {}s", config.utc_offset_secs);

    let app = build_router(AppState::new(store, &config));

    let listener = TcpListener::bind(&config.bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
