use std::time::Duration;

use rocket::figment::Figment;
use serde::Deserialize;

use crate::error::{MarketError, Result};

/// Which [`DocumentStore`](crate::repository::DocumentStore) backs the
/// marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// Settings under the `market` key of Rocket's configuration
/// (`Rocket.toml` or `ROCKET_MARKET`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub store: StoreBackend,
    pub mongo_uri: String,
    pub database: String,
    pub app_name: String,
    /// Budget for a whole operation, every step included.
    pub operation_timeout_ms: u64,
    /// Budget for one reference lookup during graph resolution.
    pub lookup_timeout_ms: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            store: StoreBackend::Mongo,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database: "acex".to_string(),
            app_name: "ace-exchange".to_string(),
            operation_timeout_ms: 3000,
            lookup_timeout_ms: 1000,
        }
    }
}

impl MarketConfig {
    pub const KEY: &'static str = "market";

    /// Reads the `market` section, falling back to defaults when the
    /// section is missing.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        if !figment.contains(Self::KEY) {
            return Ok(Self::default());
        }
        let config: MarketConfig = figment
            .extract_inner(Self::KEY)
            .map_err(|e| MarketError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.operation_timeout_ms == 0 || self.lookup_timeout_ms == 0 {
            return Err(MarketError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.store == StoreBackend::Mongo && self.database.is_empty() {
            return Err(MarketError::Config("database name is empty".to_string()));
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::providers::{Format, Toml};

    use super::*;

    #[test]
    fn missing_section_uses_defaults() {
        let figment = Figment::new();
        let config = MarketConfig::from_figment(&figment).unwrap();
        assert_eq!(config, MarketConfig::default());
        assert_eq!(config.lookup_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let figment = Figment::from(Toml::string(
            r#"
            [market]
            store = "memory"
            lookup_timeout_ms = 250
            "#,
        ));
        let config = MarketConfig::from_figment(&figment).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.lookup_timeout(), Duration::from_millis(250));
        assert_eq!(config.operation_timeout(), Duration::from_secs(3));
        assert_eq!(config.database, "acex");
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let figment = Figment::from(Toml::string(
            r#"
            [market]
            operation_timeout_ms = 0
            "#,
        ));
        assert!(matches!(
            MarketConfig::from_figment(&figment),
            Err(MarketError::Config(_))
        ));
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let figment = Figment::from(Toml::string(
            r#"
            [market]
            store = "redis"
            "#,
        ));
        assert!(matches!(
            MarketConfig::from_figment(&figment),
            Err(MarketError::Config(_))
        ));
    }
}
