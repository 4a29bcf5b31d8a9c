// ============================
// crates/backend-bin/src/main.rs
// ============================
use huddle_backend_lib::{config::Settings, ws_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState::new(settings.clone());
    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    info!("listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
