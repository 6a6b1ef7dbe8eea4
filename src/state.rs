use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, storage::PhotoStorage};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub storage: PhotoStorage,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> Self {
        let storage = PhotoStorage::new(
            config.storage_root.clone(),
            config.app_url.clone(),
            config.max_upload_kb,
        );
        Self {
            orm,
            config: Arc::new(config),
            storage,
        }
    }
}
