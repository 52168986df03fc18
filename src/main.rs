use minapplications_backend::{
    build_router,
    config::Config,
    db,
    sse::{FeedEvent, FeedSender, publish},
    startup::AppState,
};
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt};

#[macro_use]
extern crate tracing;

#[tokio::main]
async fn main() -> ExitCode {
    // initialize tracing, INFO unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match db::init_db(&config.database_url, config.db_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {e}");
            return ExitCode::FAILURE;
        }
    };

    if std::env::args().nth(1).as_deref() == Some("seed") {
        return match db::seed_applications(&pool).await {
            Ok(count) => {
                info!("Seeded {count} applications");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Seeding failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match db::reconcile_counters(&pool).await {
        Ok(0) => debug!("Vote counters match the ledger"),
        Ok(fixed) => warn!("Reconciled vote counters on {fixed} suggestions"),
        Err(e) => error!("Vote counter reconciliation failed: {e}"),
    }

    let app_state = AppState::new(pool, &config);
    app_state.spawn_health_check();
    let feed = app_state.feed.clone();

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Unable to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("listening on {addr}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(feed))
        .await
    {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Server shut down");
    ExitCode::SUCCESS
}

async fn shutdown_signal(feed: FeedSender) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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

    // open event streams would otherwise hold the shutdown open
    publish(&feed, FeedEvent::Closing);
}
