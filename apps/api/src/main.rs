use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use emias_cell::EmiasClient;
use shared_config::AppConfig;
use shared_database::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
use slot_watch_cell::{PollerConfig, SlotPollerService, SmtpNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EMIAS slot watcher");

    // Load configuration
    let config = AppConfig::from_env();

    if !config.is_mail_configured() {
        bail!("SMTP_USERNAME, SMTP_PASSWORD and MAIL_FROM must be set to send notifications");
    }

    let store: Arc<dyn AppointmentStore> = if config.is_store_configured() {
        Arc::new(SupabaseAppointmentStore::new(&config).context("building Supabase store")?)
    } else {
        warn!("Supabase is not configured, requests are kept in memory and lost on restart");
        Arc::new(InMemoryAppointmentStore::new())
    };

    let emias = Arc::new(EmiasClient::from_app_config(&config).context("building EMIAS client")?);
    let notifier = Arc::new(SmtpNotifier::new(&config).context("building SMTP notifier")?);

    let poller = Arc::new(SlotPollerService::new(
        PollerConfig::from_app_config(&config),
        emias.clone(),
        store,
        notifier,
    ));
    poller.start();

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(emias, poller.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("HTTP server stopped, waiting for the poller");
    poller.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
