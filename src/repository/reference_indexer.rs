use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use tracing::debug;

use crate::error::{MarketError, Result};
use crate::models::CollectionName;
use crate::repository::deadline::Deadline;
use crate::repository::entity_store::EntityStore;

/// Keeps back-reference arrays in step with the forward references held
/// elsewhere. Each call is one atomic single-document update and is not
/// atomic with any other write.
#[derive(Clone)]
pub struct ReferenceIndexer {
    store: EntityStore,
}

impl ReferenceIndexer {
    pub fn new(store: EntityStore) -> Self {
        ReferenceIndexer { store }
    }

    /// Appends `reference_id` to `field` on the target. Not idempotent:
    /// a second call appends a second copy.
    pub async fn add_reference(
        &self,
        target: CollectionName,
        target_id: ObjectId,
        field: &str,
        reference_id: ObjectId,
        deadline: Deadline,
    ) -> Result<()> {
        let update = doc! { "$push": { field: reference_id } };
        match self
            .store
            .update_document(target, &target_id, update, deadline)
            .await?
        {
            Some(_) => {
                debug!(%target, %target_id, field, %reference_id, "reference added");
                Ok(())
            }
            None => Err(MarketError::not_found(target, target_id)),
        }
    }

    /// Removes every occurrence of `reference_id` from `field`. Absent
    /// values and absent targets both leave nothing to do.
    pub async fn remove_reference(
        &self,
        target: CollectionName,
        target_id: ObjectId,
        field: &str,
        reference_id: ObjectId,
        deadline: Deadline,
    ) -> Result<()> {
        let update = doc! { "$pull": { field: reference_id } };
        let updated = self
            .store
            .update_document(target, &target_id, update, deadline)
            .await?;
        if updated.is_none() {
            debug!(%target, %target_id, field, "reference target already gone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use mongodb::bson::{Bson, Document};

    use super::*;
    use crate::repository::memory_store::MemoryStore;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(1))
    }

    async fn setup() -> (EntityStore, ReferenceIndexer, ObjectId) {
        let store = EntityStore::new(Arc::new(MemoryStore::new()));
        let user = store
            .insert(
                CollectionName::Users,
                doc! { "listings": [] },
                deadline(),
            )
            .await
            .unwrap();
        let indexer = ReferenceIndexer::new(store.clone());
        (store, indexer, user)
    }

    async fn listings_of(store: &EntityStore, user: ObjectId) -> Vec<Bson> {
        let doc: Document = store
            .find_document(CollectionName::Users, &user, deadline())
            .await
            .unwrap()
            .unwrap();
        doc.get_array("listings").unwrap().clone()
    }

    #[tokio::test]
    async fn add_appends_even_when_already_present() {
        let (store, indexer, user) = setup().await;
        let listing = ObjectId::new();
        for _ in 0..2 {
            indexer
                .add_reference(CollectionName::Users, user, "listings", listing, deadline())
                .await
                .unwrap();
        }
        assert_eq!(
            listings_of(&store, user).await,
            vec![Bson::ObjectId(listing), Bson::ObjectId(listing)]
        );
    }

    #[tokio::test]
    async fn add_to_missing_target_is_not_found() {
        let (_, indexer, _) = setup().await;
        let result = indexer
            .add_reference(
                CollectionName::Users,
                ObjectId::new(),
                "listings",
                ObjectId::new(),
                deadline(),
            )
            .await;
        assert!(matches!(result, Err(MarketError::NotFound { .. })));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (store, indexer, user) = setup().await;
        let keep = ObjectId::new();
        let drop = ObjectId::new();
        for id in [keep, drop, drop] {
            indexer
                .add_reference(CollectionName::Users, user, "listings", id, deadline())
                .await
                .unwrap();
        }

        indexer
            .remove_reference(CollectionName::Users, user, "listings", drop, deadline())
            .await
            .unwrap();
        let once = listings_of(&store, user).await;

        indexer
            .remove_reference(CollectionName::Users, user, "listings", drop, deadline())
            .await
            .unwrap();
        let twice = listings_of(&store, user).await;

        assert_eq!(once, vec![Bson::ObjectId(keep)]);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn remove_from_missing_target_succeeds() {
        let (_, indexer, _) = setup().await;
        indexer
            .remove_reference(
                CollectionName::Items,
                ObjectId::new(),
                "listings",
                ObjectId::new(),
                deadline(),
            )
            .await
            .unwrap();
    }
}
