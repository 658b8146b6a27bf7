pub mod market_config;
pub mod mongo_config;

pub use market_config::{MarketConfig, StoreBackend};
pub use mongo_config::{open_store, setup_mongo};
