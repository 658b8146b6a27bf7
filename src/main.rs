use ace_exchange::config::{open_store, MarketConfig};
use ace_exchange::{routes, Marketplace};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rocket = rocket::build();
    let config = MarketConfig::from_figment(rocket.figment())?;
    let store = open_store(&config).await?;
    info!(store = ?config.store, "starting marketplace");

    let _ = routes::mount(rocket, Marketplace::new(store, config))
        .launch()
        .await?;
    Ok(())
}
