//! aircast - Main entry point
//!
//! Loads the station roster, spawns one worker per station, starts them
//! all, and runs the Telegram command loop plus the HTTP listing endpoint
//! until shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aircast::bot::{telegram, BotClient, CommandRouter};
use aircast::config::Settings;
use aircast::pipeline::PipelineFactory;
use aircast::station::StationRegistry;

/// Command-line arguments for aircast
#[derive(Parser, Debug)]
#[command(name = "aircast")]
#[command(about = "Multi-station internet radio relay")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "aircast.toml", env = "AIRCAST_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aircast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = Settings::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    info!("Loaded configuration: {} stations", settings.stations.len());

    let factory = pipeline_factory()?;
    let registry = Arc::new(StationRegistry::new(
        settings.icecast.clone(),
        settings.admins.iter().copied(),
        factory,
    ));
    registry.initialize_from_config(&settings.stations).await;

    let failures = registry.start_all().await;
    if !failures.is_empty() {
        warn!("{} station(s) failed to start", failures.len());
    }

    // Telegram command loop
    let router = Arc::new(CommandRouter::new(
        Arc::clone(&registry),
        settings.session.expiry_secs.map(Duration::from_secs),
    ));
    let client = BotClient::new(&settings.telegram.token)
        .context("Failed to create Telegram client")?;
    tokio::spawn(telegram::run(client, router, settings.telegram.clone()));

    // HTTP listing endpoint
    let app = aircast::api::router(Arc::clone(&registry));
    let listener = tokio::net::TcpListener::bind(&settings.http.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.http.bind))?;
    info!("HTTP listing endpoint on {}", settings.http.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

#[cfg(feature = "gst")]
fn pipeline_factory() -> Result<Arc<dyn PipelineFactory>> {
    let factory =
        aircast::pipeline::gst::GstPipelineFactory::new().context("Failed to initialize GStreamer")?;
    Ok(Arc::new(factory))
}

#[cfg(not(feature = "gst"))]
fn pipeline_factory() -> Result<Arc<dyn PipelineFactory>> {
    warn!("Built without the 'gst' feature; broadcasting is disabled (dry run)");
    Ok(Arc::new(aircast::pipeline::null::NullPipelineFactory))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
