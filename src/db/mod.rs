use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Pool options tuned for this service's workload: a few long-lived REST
/// readers plus bursts of short fire-and-forget writes spawned by the relay.
/// The acquire timeout stays short so a saturated pool delays the background
/// writes it feeds rather than the health check.
fn connect_options(database_url: &str) -> ConnectOptions {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(16)
        .min_connections(4)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(120))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);
    opts
}

/// Establish the pooled database connection.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(connect_options(database_url)).await?;
    Ok(db)
}
