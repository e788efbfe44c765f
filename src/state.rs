use crate::config::ServerConfig;
use crate::db::Db;
use std::sync::Arc;

/// Shared application state
///
/// All shared state lives behind the storage handle; request tasks never
/// share mutable in-process data.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Storage handle (shared across requests)
    pub db: Db,
}

impl ServerState {
    /// Create new server state around an established storage handle
    pub fn new(config: ServerConfig, db: Db) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}
