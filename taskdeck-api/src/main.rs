//! # Taskdeck API Server
//!
//! REST backend for the Taskdeck task manager:
//! - User accounts with signed bearer-token sessions (multi-device, with
//!   per-session and all-session revocation)
//! - Per-user task CRUD with filtering, pagination, and sorting
//! - Avatar upload, normalized to 250x250 PNG
//! - Welcome / cancellation notification emails
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskdeck-api
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdeck_api::{app::AppState, config::Config, email::Mailer};
use taskdeck_shared::db::{migrations, pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_api=debug,taskdeck_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskdeck API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let mailer = Mailer::from_config(&config.smtp)?;

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), config, mailer);
    let router = taskdeck_api::app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM
///
/// SIGTERM is what container orchestrators send on stop, so both paths must
/// drain gracefully.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
