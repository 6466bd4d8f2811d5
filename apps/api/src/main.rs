use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::{LifecycleMigrator, MigrationScheduler};
use notification_cell::{Notifier, TracingNotifier, WebhookNotifier};
use shared_config::{AppConfig, StorageBackend};
use shared_database::{InMemoryStore, SchedulingStore, SupabaseClient, SupabaseStore};
use shared_models::{Clock, SystemClock};
use shared_utils::AppState;

fn build_store(config: &AppConfig) -> Arc<dyn SchedulingStore> {
    match config.storage_backend {
        StorageBackend::Supabase if config.is_supabase_configured() => {
            info!("Using Supabase appointment store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(SupabaseClient::new(config)))
        }
        StorageBackend::Supabase => {
            warn!("STORAGE_BACKEND=supabase but Supabase is not configured, using in-memory store");
            Arc::new(InMemoryStore::new())
        }
        StorageBackend::Memory => {
            info!("Using in-memory appointment store");
            Arc::new(InMemoryStore::new())
        }
    }
}

fn build_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.notification_webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url.clone()).context("invalid NOTIFICATION_WEBHOOK_URL")?;
            info!("Delivering notifications to webhook {}", url);
            Ok(Arc::new(notifier))
        }
        None => {
            info!("No notification webhook configured, notifications will be logged");
            Ok(Arc::new(TracingNotifier))
        }
    }
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

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

    info!("Starting clinic scheduler API server");

    // Load configuration
    let config = AppConfig::from_env();

    let store = build_store(&config);
    let notifier = build_notifier(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.clinic_offset()));

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR '{}'", config.bind_addr))?;
    let migration_enabled = config.migration_enabled;
    let migration_time = config.migration_time;

    let state = AppState::new(config, store, notifier, clock);

    // Daily lifecycle migration
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = if migration_enabled {
        let migrator = Arc::new(LifecycleMigrator::from_state(&state));
        let scheduler = MigrationScheduler::new(migrator, Arc::clone(&state.clock), migration_time);
        Some(tokio::spawn(scheduler.run(shutdown_rx)))
    } else {
        info!("Lifecycle migration scheduler disabled");
        None
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            warn!("Migration scheduler task ended abnormally: {}", e);
        }
    }

    info!("Server stopped");
    Ok(())
}
