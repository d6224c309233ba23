// src/main.rs

use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use survey_session::catalog;
use survey_session::config::Config;
use survey_session::engine::SessionEngine;
use survey_session::routes;
use survey_session::services::Collaborators;
use survey_session::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let (config, config_warnings) = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "survey.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    // WAL lets snapshot reads proceed while a session write is in flight.
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    // Seed Surveys
    if let Err(e) = seed_surveys(&pool, &config).await {
        tracing::error!("Failed to seed surveys: {}", e);
    }

    let collaborators = Collaborators::from_config(&config)?;
    let engine = SessionEngine::new(
        pool.clone(),
        collaborators.scorer,
        collaborators.classifier,
        config.collaborator_timeout,
    );

    // Create AppState
    let state = AppState {
        pool,
        config: config.clone(),
        engine,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}

async fn seed_surveys(pool: &SqlitePool, config: &Config) -> Result<(), catalog::SeedError> {
    let Some(path) = &config.survey_seed_file else {
        return Ok(());
    };

    let seeds = catalog::load_seed_file(path).await?;
    let inserted = catalog::seed_surveys(pool, &seeds).await?;
    tracing::info!("Seeded {} of {} surveys from {}", inserted, seeds.len(), path);

    Ok(())
}
