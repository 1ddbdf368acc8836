use std::sync::Arc;

use crate::auth::SessionStore;
use crate::calculate::Aggregator;
use crate::config::AppConfig;
use crate::storage::{ClanRepository, JsonlRepository, StorageConfig};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ClanRepository>,
    pub sessions: Arc<SessionStore>,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ClanRepository>,
        sessions: Arc<SessionStore>,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            repository,
            sessions,
            aggregator,
        }
    }

    /// JSONL-backed state for a loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let storage = StorageConfig::new(config.data_dir.clone());
        Self::new(
            Arc::new(JsonlRepository::new(storage)),
            Arc::new(SessionStore::from_config(&config.admin)),
            Aggregator::new(config.stats.calendar),
        )
    }
}
