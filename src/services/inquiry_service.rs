use std::time::Duration;

use futures::FutureExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson};
use tracing::info;

use crate::error::{MarketError, Result};
use crate::models::{CollectionName, Listing, ListingInquiry};
use crate::repository::{Deadline, EntityStore, GraphResolver, ReferenceIndexer};
use crate::services::saga::Saga;

pub struct InquiryService {
    store: EntityStore,
    indexer: ReferenceIndexer,
    resolver: GraphResolver,
}

impl InquiryService {
    pub fn new(store: EntityStore, lookup_timeout: Duration) -> Self {
        InquiryService {
            indexer: ReferenceIndexer::new(store.clone()),
            resolver: GraphResolver::new(store.clone(), lookup_timeout),
            store,
        }
    }

    /// Opens an inquiry by `user_id` on `listing_id`, linked from both.
    ///
    /// A seller cannot inquire on their own listing, and a user holds at most
    /// one open inquiry per listing. The duplicate check reads the user's
    /// current inquiries and is not atomic with the insert. The returned
    /// record is re-read after every step has committed, so an error from
    /// that read does not mean the inquiry was rolled back.
    pub async fn create_inquiry(
        &self,
        listing_id: ObjectId,
        user_id: ObjectId,
        note: Option<String>,
        deadline: Deadline,
    ) -> Result<ListingInquiry> {
        let listing: Listing = self.store.get(&listing_id, deadline).await?;
        let user = self
            .store
            .find_document(CollectionName::Users, &user_id, deadline)
            .await?
            .ok_or_else(|| MarketError::not_found(CollectionName::Users, user_id))?;

        if listing.seller == user_id {
            return Err(MarketError::InvalidState(format!(
                "user {user_id} is the seller of listing {listing_id}"
            )));
        }

        let existing: Vec<ListingInquiry> = self
            .resolver
            .resolve_many(&user, "inquiries", deadline)
            .await?;
        if existing
            .iter()
            .any(|i| i.is_open() && i.listing == listing_id && i.buyer == user_id)
        {
            return Err(MarketError::Conflict(format!(
                "user {user_id} already has an open inquiry on listing {listing_id}"
            )));
        }

        let store = &self.store;
        let indexer = &self.indexer;
        let mut saga = Saga::new("create_inquiry");

        let note = note.map_or(Bson::Null, Bson::String);
        let inquiry_id = saga
            .step(
                "insert inquiry",
                store.insert(
                    CollectionName::Inquiries,
                    doc! {
                        "note": note,
                        "accepted": Bson::Null,
                        "declined": Bson::Null,
                        "deleted": false,
                        "buyer": user_id,
                        "listing": listing_id,
                    },
                    deadline,
                ),
                move |id: &ObjectId| {
                    let id = *id;
                    async move {
                        store
                            .remove(CollectionName::Inquiries, &id, deadline)
                            .await
                            .map(|_| ())
                    }
                    .boxed()
                },
            )
            .await?;

        saga.step(
            "link listing",
            indexer.add_reference(
                CollectionName::Listings,
                listing_id,
                "inquiries",
                inquiry_id,
                deadline,
            ),
            move |_| {
                indexer
                    .remove_reference(
                        CollectionName::Listings,
                        listing_id,
                        "inquiries",
                        inquiry_id,
                        deadline,
                    )
                    .boxed()
            },
        )
        .await?;

        saga.final_step(
            "link buyer",
            indexer.add_reference(
                CollectionName::Users,
                user_id,
                "inquiries",
                inquiry_id,
                deadline,
            ),
        )
        .await?;

        info!(%inquiry_id, %listing_id, buyer = %user_id, "inquiry created");
        self.store.get(&inquiry_id, deadline).await
    }
}
