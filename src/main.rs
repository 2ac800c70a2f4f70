use anyhow::Context;
use backend::app;
use backend::config::settings::AppConfig;
use backend::infrastructure::ffmpeg::{plan, probe};
use backend::state::AppState;
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = AppConfig::new();

    // Probe once before any route is reachable; plans are read-only after this.
    let capabilities = probe::probe_or_baseline(&config.ffmpeg_path);
    let plans = plan::select_plans(&capabilities);

    let state = AppState::new(config.clone(), plans);
    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
