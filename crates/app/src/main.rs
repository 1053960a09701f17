//! `orrery-app` -- headless runner for the planets application.
//!
//! Builds the application state over an in-memory store, starts the planet
//! service and the list feed, and logs every snapshot until shutdown.
//!
//! # Environment variables
//!
//! | Variable              | Required | Description                                   |
//! |-----------------------|----------|-----------------------------------------------|
//! | `ORRERY_ENDPOINT_URL` | yes      | Sync endpoint host, without scheme            |
//! | `ORRERY_APP_ID`       | yes      | Application id                                |
//! | `ORRERY_AUTH_TOKEN`   | yes      | Playground authentication token               |
//! | `ORRERY_SEED_FILE`    | no       | JSON array of planet documents to preload     |

use std::sync::Arc;

use orrery_app::config::AppConfig;
use orrery_app::state::AppState;
use orrery_store::repositories::planet_repo::COLLECTION;
use orrery_store::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orrery_app=info,orrery_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        app_id = %config.app_id,
        websocket_url = %config.websocket_url(),
        "Loaded configuration",
    );

    // --- Store ---
    let store = Arc::new(MemoryStore::new());
    if let Ok(path) = std::env::var("ORRERY_SEED_FILE") {
        let seeded = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| store.seed_json(COLLECTION, &json).map_err(|e| e.to_string()));
        match seeded {
            Ok(count) => tracing::info!(path = %path, count, "Seeded planets"),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to load seed file");
                std::process::exit(1);
            }
        }
    }

    // --- App state ---
    let state = AppState::new(config, store);
    if let Err(e) = state.service.init() {
        tracing::error!(error = %e, "Failed to start planet service");
        std::process::exit(1);
    }

    // --- Planets list ---
    let list = state.planets_list_view_model();
    let _render = list.subscribe(|planets| {
        let names: Vec<&str> = planets.iter().map(|p| p.name.as_str()).collect();
        tracing::info!(count = planets.len(), planets = ?names, "Planets updated");
    });
    list.start();

    let mut errors = state.errors.watch();
    let error_log = tokio::spawn(async move {
        while errors.changed().await.is_ok() {
            if let Some(error) = errors.borrow_and_update().clone() {
                tracing::warn!(message = %error.message, "User-facing error");
            }
        }
    });

    tracing::info!("Orrery running, press Ctrl-C to stop");
    shutdown_signal().await;

    // --- Shutdown ---
    list.stop().await;
    state.service.dispose();
    error_log.abort();
    tracing::info!("Shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
