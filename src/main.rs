use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use admissions_core::{
    CoreConfig, PatientService,
    config::{database_path_from_env_value, reference_data_from_env_value},
    constants::{DATABASE_PATH_ENV, DEFAULT_REST_ADDR, REFERENCE_DATA_ENV, REST_ADDR_ENV},
};
use api_rest::AppState;

/// Main entry point for the admissions service
///
/// Resolves configuration from the environment once, opens the patient database and serves the
/// REST API until interrupted.
///
/// # Environment Variables
/// - `ADMISSIONS_REST_ADDR`: REST server address (default: "0.0.0.0:5001")
/// - `ADMISSIONS_DB_PATH`: SQLite database file (default: "patient.db")
/// - `ADMISSIONS_REFERENCE_DATA`: optional YAML file with genders, wards/rooms and doctors
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the reference data file cannot be read or is invalid,
/// - the database cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admissions=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let database_path = database_path_from_env_value(std::env::var(DATABASE_PATH_ENV).ok());
    let reference = reference_data_from_env_value(std::env::var(REFERENCE_DATA_ENV).ok())?;
    let cfg = Arc::new(CoreConfig::new(database_path, reference)?);

    let service = PatientService::open(cfg)?;
    let app = api_rest::app(AppState { service });

    tracing::info!("++ Starting admissions REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    Ok(())
}
