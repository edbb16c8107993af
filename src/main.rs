//! Cleaning Plan - A cleaning plan server with per-task countdown timers
//!
//! This is the main entry point for the cleaning-plan application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cleaning_plan::{
    api::{create_router, responses::VERSION},
    config::Config,
    services::{InMemoryTaskStore, SilentSink, ToneSink},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("cleaning_plan={},tower_http=info", config.log_level()))
        .init();

    info!("Starting cleaning-plan server v{}", VERSION);
    info!("Configuration: host={}, port={}, mute={}",
          config.host, config.port, config.mute);

    let state = Arc::new(AppState::new(
        Arc::new(InMemoryTaskStore::with_catalog()),
        tone_sink(&config),
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /plan                  - Generate the cleaning plan");
    info!("  GET    /options               - Selection and timer choices");
    info!("  GET    /dashboard             - Progress, streak and badges");
    info!("  POST   /tasks                 - Add a task");
    info!("  POST   /tasks/:id/toggle      - Toggle task completion");
    info!("  DELETE /tasks/:id             - Delete a task");
    info!("  POST   /tasks/:id/timer       - Show a task timer");
    info!("  POST   /tasks/:id/timer/start - Start, pause, reset, settings, preset, custom");
    info!("  GET    /status                - Server status");
    info!("  GET    /health                - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(feature = "playback")]
fn tone_sink(config: &Config) -> Arc<dyn ToneSink> {
    if config.mute {
        Arc::new(SilentSink)
    } else {
        info!("Audio cues play on the default output device");
        Arc::new(cleaning_plan::services::DeviceSink)
    }
}

#[cfg(not(feature = "playback"))]
fn tone_sink(config: &Config) -> Arc<dyn ToneSink> {
    if !config.mute {
        info!("Built without the playback feature, audio cues are silent");
    }
    Arc::new(SilentSink)
}
