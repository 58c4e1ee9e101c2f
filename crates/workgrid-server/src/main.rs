//! Workgrid Server — application entry point.

use tracing_subscriber::EnvFilter;
use workgrid_db::{DbConfig, DbManager};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("workgrid=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Workgrid server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(e) = workgrid_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    // TODO: wire the HTTP router once the handler layer lands.

    tracing::info!("Workgrid server stopped.");
}
