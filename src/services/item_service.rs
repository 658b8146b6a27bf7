use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;

use crate::error::{MarketError, Result};
use crate::models::{CollectionName, Item};
use crate::repository::{Deadline, EntityStore};

/// Read-only access to the item catalogue.
pub struct ItemService {
    store: EntityStore,
}

impl ItemService {
    pub fn new(store: EntityStore) -> Self {
        ItemService { store }
    }

    pub async fn get_item(&self, item_id: ObjectId, deadline: Deadline) -> Result<Item> {
        self.store.get(&item_id, deadline).await
    }

    pub async fn get_item_by_name(&self, name: &str, deadline: Deadline) -> Result<Item> {
        self.store
            .find_one_by(doc! { "name": name }, deadline)
            .await?
            .ok_or_else(|| MarketError::not_found(CollectionName::Items, name))
    }

    pub async fn get_items(&self, deadline: Deadline) -> Result<Vec<Item>> {
        self.store.find_all(doc! {}, deadline).await
    }
}
