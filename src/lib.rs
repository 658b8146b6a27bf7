//! Marketplace backend over a document store: items, users, listings,
//! inquiries and reports, with back-reference arrays kept in step by
//! compensating workflows.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::MarketConfig;
pub use error::{MarketError, Result};
pub use marketplace::Marketplace;
