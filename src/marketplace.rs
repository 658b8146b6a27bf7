//! The operations callers see, addressed by external id strings.

use std::sync::Arc;

use tracing::debug;

use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::models::identity::{parse_id, present};
use crate::models::{EntityKind, Item, Listing, ListingInquiry, User, UserReport};
use crate::repository::{Deadline, DocumentStore, EntityStore, GraphResolver};
use crate::services::{InquiryService, ItemService, ListingService, UserService};

/// Every service wired to one store handle. Each call gets a fresh
/// [`Deadline`] of `operation_timeout` that bounds all of its steps.
pub struct Marketplace {
    config: MarketConfig,
    store: EntityStore,
    resolver: GraphResolver,
    items: ItemService,
    users: UserService,
    listings: ListingService,
    inquiries: InquiryService,
}

impl Marketplace {
    pub fn new(backend: Arc<dyn DocumentStore>, config: MarketConfig) -> Self {
        let store = EntityStore::new(backend);
        Marketplace {
            resolver: GraphResolver::new(store.clone(), config.lookup_timeout()),
            items: ItemService::new(store.clone()),
            users: UserService::new(store.clone()),
            listings: ListingService::new(store.clone()),
            inquiries: InquiryService::new(store.clone(), config.lookup_timeout()),
            store,
            config,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.config.operation_timeout())
    }

    /// Looks an item up by id, or by exact name when no id is given.
    pub async fn get_item(&self, id: Option<&str>, name: Option<&str>) -> Result<Item> {
        match (id, name) {
            (Some(id), _) => self.items.get_item(parse_id(id)?, self.deadline()).await,
            (None, Some(name)) => self.items.get_item_by_name(name, self.deadline()).await,
            (None, None) => Err(MarketError::InvalidArgument(
                "one of id or name is required".to_string(),
            )),
        }
    }

    pub async fn get_items(&self) -> Result<Vec<Item>> {
        self.items.get_items(self.deadline()).await
    }

    pub async fn add_user(&self, discord_id: i64) -> Result<User> {
        self.users.add_user(discord_id, self.deadline()).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        self.users.get_user(parse_id(id)?, self.deadline()).await
    }

    pub async fn ban_user(&self, id: &str, note: Option<String>) -> Result<User> {
        self.users.ban_user(parse_id(id)?, note, self.deadline()).await
    }

    pub async fn set_user_admin(&self, id: &str, is_admin: bool) -> Result<User> {
        self.users
            .set_user_admin(parse_id(id)?, is_admin, self.deadline())
            .await
    }

    pub async fn delete_user(&self, id: &str) -> Result<User> {
        self.users.delete_user(parse_id(id)?, self.deadline()).await
    }

    pub async fn create_listing(&self, item_id: &str, user_id: &str, price: i64) -> Result<Listing> {
        let item_id = parse_id(item_id)?;
        let user_id = parse_id(user_id)?;
        self.listings
            .create_listing(item_id, user_id, price, self.deadline())
            .await
    }

    pub async fn get_listing(&self, id: &str) -> Result<Listing> {
        self.listings.get_listing(parse_id(id)?, self.deadline()).await
    }

    pub async fn get_listings(&self) -> Result<Vec<Listing>> {
        self.listings.get_listings(self.deadline()).await
    }

    pub async fn delete_listing(&self, id: &str) -> Result<Listing> {
        self.listings
            .delete_listing(parse_id(id)?, self.deadline())
            .await
    }

    pub async fn create_inquiry(
        &self,
        listing_id: &str,
        user_id: &str,
        note: Option<String>,
    ) -> Result<ListingInquiry> {
        let listing_id = parse_id(listing_id)?;
        let user_id = parse_id(user_id)?;
        self.inquiries
            .create_inquiry(listing_id, user_id, note, self.deadline())
            .await
    }

    pub async fn report_user(
        &self,
        reporter_id: &str,
        scumbag_id: &str,
        note: String,
    ) -> Result<UserReport> {
        let reporter = parse_id(reporter_id)?;
        let scumbag = parse_id(scumbag_id)?;
        self.users
            .report_user(reporter, scumbag, note, self.deadline())
            .await
    }

    /// The presented form of one document with the named relationship
    /// fields replaced by the documents they reference.
    pub async fn expand(&self, kind: EntityKind, id: &str, fields: &[&str]) -> Result<serde_json::Value> {
        let id = parse_id(id)?;
        let collection = kind.collection();
        let deadline = self.deadline();
        let doc = self
            .store
            .find_document(collection, &id, deadline)
            .await?
            .ok_or_else(|| MarketError::not_found(collection, id))?;
        debug!(%collection, %id, ?fields, "expanding");
        let expanded = self.resolver.expand(kind, doc, fields, deadline).await?;
        present(expanded)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mongodb::bson::doc;

    use super::*;
    use crate::models::CollectionName;
    use crate::repository::MemoryStore;

    async fn marketplace() -> (Marketplace, String) {
        let backend = Arc::new(MemoryStore::new());
        let store = EntityStore::new(backend.clone());
        let item = store
            .insert(
                CollectionName::Items,
                doc! {
                    "name": "Iron Nugget",
                    "category": "Materials",
                    "inGamePrice": 100,
                    "currentAvg": 0,
                    "currentMedian": 0,
                    "records": [],
                    "listings": [],
                },
                Deadline::after(Duration::from_secs(1)),
            )
            .await
            .unwrap();
        (Marketplace::new(backend, MarketConfig::default()), item.to_hex())
    }

    #[tokio::test]
    async fn malformed_ids_are_invalid_arguments() {
        let (market, item) = marketplace().await;
        for result in [
            market.get_user("nope").await.map(|_| ()),
            market.delete_user("").await.map(|_| ()),
            market.create_listing(&item, "xyz", 10).await.map(|_| ()),
            market.report_user("1234", &item, "x".into()).await.map(|_| ()),
        ] {
            assert!(matches!(result, Err(MarketError::InvalidArgument(_))));
        }
    }

    #[tokio::test]
    async fn get_item_prefers_id_and_requires_one_key() {
        let (market, item) = marketplace().await;
        let by_id = market.get_item(Some(&item), Some("wrong name")).await.unwrap();
        assert_eq!(by_id.name, "Iron Nugget");
        let by_name = market.get_item(None, Some("Iron Nugget")).await.unwrap();
        assert_eq!(by_name.id, by_id.id);
        assert!(matches!(
            market.get_item(None, None).await,
            Err(MarketError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn listing_flow_through_external_ids() {
        let (market, item) = marketplace().await;
        let seller = market.add_user(1).await.unwrap().id.to_hex();
        let buyer = market.add_user(2).await.unwrap().id.to_hex();

        let listing = market.create_listing(&item, &seller, 900).await.unwrap();
        let listing_id = listing.id.to_hex();
        let inquiry = market
            .create_inquiry(&listing_id, &buyer, Some("hi".into()))
            .await
            .unwrap();

        let expanded = market
            .expand(EntityKind::Listing, &listing_id, &["seller", "inquiries"])
            .await
            .unwrap();
        assert_eq!(expanded["id"], listing_id.as_str());
        assert_eq!(expanded["seller"]["id"], seller.as_str());
        assert_eq!(expanded["seller"]["discordID"], 1);
        assert_eq!(expanded["inquiries"][0]["id"], inquiry.id.to_hex().as_str());
        assert_eq!(expanded["item"], item.as_str());
        assert!(expanded["created"].is_string());

        let all = market.get_listings().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, listing.id);

        market.delete_listing(&listing_id).await.unwrap();
        assert!(market.get_listings().await.unwrap().is_empty());
        assert!(matches!(
            market.get_listing(&listing_id).await,
            Err(MarketError::NotFound { .. })
        ));
        assert!(market.get_item(Some(&item), None).await.unwrap().listings.is_empty());
    }

    #[tokio::test]
    async fn expanding_an_unknown_field_is_a_schema_violation() {
        let (market, _) = marketplace().await;
        let user = market.add_user(5).await.unwrap().id.to_hex();
        assert!(matches!(
            market.expand(EntityKind::User, &user, &["reputation"]).await,
            Err(MarketError::SchemaViolation { .. })
        ));
        assert!(matches!(
            market
                .expand(EntityKind::User, &mongodb::bson::oid::ObjectId::new().to_hex(), &[])
                .await,
            Err(MarketError::NotFound { .. })
        ));
    }
}
