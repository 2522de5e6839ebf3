use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub storage: Arc<ObjectStore>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Config) -> Self {
        let storage = Arc::new(ObjectStore::new(config.storage_dir.clone()));
        Self {
            db,
            config: Arc::new(config),
            storage,
        }
    }
}
