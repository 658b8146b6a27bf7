use futures::FutureExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson};
use tracing::{error, info};

use crate::error::{MarketError, Result};
use crate::models::listing::{MAX_PRICE, MIN_PRICE};
use crate::models::{CollectionName, Item, Listing, User};
use crate::repository::{Deadline, EntityStore, ReferenceIndexer};
use crate::services::saga::Saga;

pub struct ListingService {
    store: EntityStore,
    indexer: ReferenceIndexer,
}

impl ListingService {
    pub fn new(store: EntityStore) -> Self {
        let indexer = ReferenceIndexer::new(store.clone());
        ListingService { store, indexer }
    }

    pub async fn get_listing(&self, listing_id: ObjectId, deadline: Deadline) -> Result<Listing> {
        self.store.get(&listing_id, deadline).await
    }

    pub async fn get_listings(&self, deadline: Deadline) -> Result<Vec<Listing>> {
        self.store.find_all(doc! {}, deadline).await
    }

    /// Inserts the listing, then links it from its item and its seller. A
    /// failed link undoes the steps before it.
    ///
    /// The returned record is re-read after every step has committed; an
    /// error from that read leaves the listing and both links in place.
    pub async fn create_listing(
        &self,
        item_id: ObjectId,
        user_id: ObjectId,
        price: i64,
        deadline: Deadline,
    ) -> Result<Listing> {
        if !Listing::price_in_bounds(price) {
            return Err(MarketError::InvalidArgument(format!(
                "price {price} outside [{MIN_PRICE}, {MAX_PRICE}]"
            )));
        }
        self.store.get::<Item>(&item_id, deadline).await?;
        self.store.get::<User>(&user_id, deadline).await?;

        let store = &self.store;
        let indexer = &self.indexer;
        let mut saga = Saga::new("create_listing");

        let listing_id = saga
            .step(
                "insert listing",
                store.insert(
                    CollectionName::Listings,
                    doc! {
                        "price": price,
                        "deleted": false,
                        "accepted": Bson::Null,
                        "seller": user_id,
                        "buyer": Bson::Null,
                        "item": item_id,
                        "inquiries": [],
                    },
                    deadline,
                ),
                move |id: &ObjectId| {
                    let id = *id;
                    async move {
                        store
                            .remove(CollectionName::Listings, &id, deadline)
                            .await
                            .map(|_| ())
                    }
                    .boxed()
                },
            )
            .await?;

        saga.step(
            "link item",
            indexer.add_reference(
                CollectionName::Items,
                item_id,
                "listings",
                listing_id,
                deadline,
            ),
            move |_| {
                indexer
                    .remove_reference(
                        CollectionName::Items,
                        item_id,
                        "listings",
                        listing_id,
                        deadline,
                    )
                    .boxed()
            },
        )
        .await?;

        saga.final_step(
            "link seller",
            indexer.add_reference(
                CollectionName::Users,
                user_id,
                "listings",
                listing_id,
                deadline,
            ),
        )
        .await?;

        info!(%listing_id, %item_id, seller = %user_id, price, "listing created");
        self.store.get(&listing_id, deadline).await
    }

    /// Deletes the listing, then strips it from its item and seller. The
    /// listing is gone once step one succeeds, so cleanup failures are only
    /// logged and can leave a dangling back-reference.
    pub async fn delete_listing(&self, listing_id: ObjectId, deadline: Deadline) -> Result<Listing> {
        let listing: Listing = self.store.take(&listing_id, deadline).await?;

        let back_references = [
            (CollectionName::Items, listing.item),
            (CollectionName::Users, listing.seller),
        ];
        for (collection, owner) in back_references {
            if let Err(err) = self
                .indexer
                .remove_reference(collection, owner, "listings", listing.id, deadline)
                .await
            {
                error!(
                    %listing_id,
                    %collection,
                    %owner,
                    error = %err,
                    "failed to strip deleted listing; back-reference left dangling"
                );
            }
        }

        info!(%listing_id, "listing deleted");
        Ok(listing)
    }
}
