use std::sync::Arc;

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

use crate::config::market_config::{MarketConfig, StoreBackend};
use crate::error::Result;
use crate::repository::{DocumentStore, MemoryStore, MongoStore};

pub async fn setup_mongo(config: &MarketConfig) -> Result<Database> {
    let mut client_options = ClientOptions::parse(&config.mongo_uri).await?;
    client_options.app_name = Some(config.app_name.clone());
    client_options.server_selection_timeout = Some(config.operation_timeout());
    let client = Client::with_options(client_options)?;
    Ok(client.database(&config.database))
}

/// Builds the store handle every component is constructed with.
pub async fn open_store(config: &MarketConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store {
        StoreBackend::Mongo => {
            let db = setup_mongo(config).await?;
            info!(uri = %config.mongo_uri, database = %config.database, "using MongoDB store");
            Ok(Arc::new(MongoStore::new(db)))
        }
        StoreBackend::Memory => {
            info!("using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
