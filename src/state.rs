use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::hub::Hub;
use crate::persistence::PersistenceGateway;

/// Shared application state available to all request handlers via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub hub: Hub,
    pub persist: PersistenceGateway,
}

impl AppState {
    /// Assemble the state for a fresh database connection: an empty hub and a
    /// persistence gateway over the same pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let persist = PersistenceGateway::new(db.clone());
        Self {
            db,
            config,
            hub: Hub::new(),
            persist,
        }
    }
}
