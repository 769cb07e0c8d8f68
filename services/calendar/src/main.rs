use anyhow::Result;
use calendar::{
    AppState, MIGRATOR, bootstrap, config::Settings, create_router, token::RandomTokenGenerator,
};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use mockable::DefaultClock;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting calendar service");

    let settings = Settings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    let bind_address = settings.bind_address();
    let app_state = AppState::new(
        pool,
        settings,
        Arc::new(DefaultClock),
        Arc::new(RandomTokenGenerator),
    )?;

    bootstrap::ensure_admin(&app_state).await?;

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Calendar service listening on {}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Calendar service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
