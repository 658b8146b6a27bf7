//! Lazy dereferencing of relationship fields.
//!
//! Documents store the ObjectId(s) of what they reference, never the
//! referenced document itself. When a caller wants the graph-shaped view,
//! the field is decoded once into a [`Reference`] and each id is fetched
//! with its own point lookup.

use std::time::Duration;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};

use crate::error::{MarketError, Result};
use crate::models::{Cardinality, CollectionName, Entity, EntityKind};
use crate::repository::deadline::Deadline;
use crate::repository::entity_store::{decode, EntityStore};

/// What a relationship field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Many(Vec<ObjectId>),
    One(ObjectId),
    /// Explicitly empty relationship.
    Null,
    /// The document has no such field at all.
    Absent,
}

impl Reference {
    /// Fails with `SchemaViolation` when the field holds anything other than
    /// ids, an id array or null.
    pub fn decode(doc: &Document, field: &str, target: CollectionName) -> Result<Reference> {
        let violation = || MarketError::SchemaViolation {
            collection: target,
            field: field.to_string(),
        };
        match doc.get(field) {
            None => Ok(Reference::Absent),
            Some(Bson::Null) => Ok(Reference::Null),
            Some(Bson::ObjectId(id)) => Ok(Reference::One(*id)),
            Some(Bson::Array(values)) => values
                .iter()
                .map(|value| match value {
                    Bson::ObjectId(id) => Ok(*id),
                    _ => Err(violation()),
                })
                .collect::<Result<Vec<_>>>()
                .map(Reference::Many),
            Some(_) => Err(violation()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Many(Vec<Document>),
    One(Document),
    Null,
}

impl ResolvedValue {
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            ResolvedValue::Many(docs) => docs,
            ResolvedValue::One(doc) => vec![doc],
            ResolvedValue::Null => Vec::new(),
        }
    }

    fn into_bson(self) -> Bson {
        match self {
            ResolvedValue::Many(docs) => Bson::Array(docs.into_iter().map(Bson::Document).collect()),
            ResolvedValue::One(doc) => Bson::Document(doc),
            ResolvedValue::Null => Bson::Null,
        }
    }
}

#[derive(Clone)]
pub struct GraphResolver {
    store: EntityStore,
    lookup_timeout: Duration,
}

impl GraphResolver {
    pub fn new(store: EntityStore, lookup_timeout: Duration) -> Self {
        GraphResolver {
            store,
            lookup_timeout,
        }
    }

    pub async fn resolve_field(
        &self,
        parent: &Document,
        field: &str,
        target: CollectionName,
        deadline: Deadline,
    ) -> Result<ResolvedValue> {
        match Reference::decode(parent, field, target)? {
            Reference::Many(ids) => {
                // One point lookup per id, in stored order.
                let mut docs = Vec::with_capacity(ids.len());
                for id in ids {
                    docs.push(self.lookup(target, id, deadline).await?);
                }
                Ok(ResolvedValue::Many(docs))
            }
            Reference::One(id) => Ok(ResolvedValue::One(self.lookup(target, id, deadline).await?)),
            Reference::Null => Ok(ResolvedValue::Null),
            Reference::Absent => Err(MarketError::SchemaViolation {
                collection: target,
                field: field.to_string(),
            }),
        }
    }

    /// Resolves `field` and decodes every referenced document as `T`.
    pub async fn resolve_many<T: Entity>(
        &self,
        parent: &Document,
        field: &str,
        deadline: Deadline,
    ) -> Result<Vec<T>> {
        self.resolve_field(parent, field, T::KIND.collection(), deadline)
            .await?
            .into_documents()
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Replaces each named relationship field of `doc` with what it points
    /// at. The target collection comes from the relationship table of
    /// `kind`; a field not in that table, or holding a shape its
    /// cardinality does not allow, is a `SchemaViolation`.
    pub async fn expand(
        &self,
        kind: EntityKind,
        mut doc: Document,
        fields: &[&str],
        deadline: Deadline,
    ) -> Result<Document> {
        for field in fields {
            let relation = kind
                .relation(field)
                .ok_or_else(|| MarketError::SchemaViolation {
                    collection: kind.collection(),
                    field: field.to_string(),
                })?;
            let resolved = self
                .resolve_field(&doc, relation.field, relation.target, deadline)
                .await?;
            if !admits(relation.cardinality, &resolved) {
                return Err(MarketError::SchemaViolation {
                    collection: relation.target,
                    field: relation.field.to_string(),
                });
            }
            doc.insert(relation.field, resolved.into_bson());
        }
        Ok(doc)
    }

    async fn lookup(&self, target: CollectionName, id: ObjectId, deadline: Deadline) -> Result<Document> {
        self.store
            .find_document(target, &id, deadline.tightened(self.lookup_timeout))
            .await?
            .ok_or(MarketError::ReferenceNotFound {
                collection: target,
                id,
            })
    }
}

fn admits(cardinality: Cardinality, resolved: &ResolvedValue) -> bool {
    matches!(
        (cardinality, resolved),
        (Cardinality::Many, ResolvedValue::Many(_))
            | (Cardinality::One, ResolvedValue::One(_))
            | (Cardinality::Optional, ResolvedValue::One(_) | ResolvedValue::Null)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mongodb::bson::doc;

    use super::*;
    use crate::models::ListingInquiry;
    use crate::repository::memory_store::MemoryStore;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(1))
    }

    fn resolver(backend: Arc<MemoryStore>) -> (EntityStore, GraphResolver) {
        let store = EntityStore::new(backend);
        let resolver = GraphResolver::new(store.clone(), Duration::from_secs(1));
        (store, resolver)
    }

    #[test]
    fn decode_covers_every_shape() {
        let id = ObjectId::new();
        let doc = doc! {
            "many": [id],
            "one": id,
            "none": Bson::Null,
            "price": 10,
            "mixed": [id, "x"],
        };
        let target = CollectionName::Users;
        assert_eq!(
            Reference::decode(&doc, "many", target).unwrap(),
            Reference::Many(vec![id])
        );
        assert_eq!(Reference::decode(&doc, "one", target).unwrap(), Reference::One(id));
        assert_eq!(Reference::decode(&doc, "none", target).unwrap(), Reference::Null);
        assert_eq!(Reference::decode(&doc, "gone", target).unwrap(), Reference::Absent);
        assert!(matches!(
            Reference::decode(&doc, "price", target),
            Err(MarketError::SchemaViolation { .. })
        ));
        assert!(matches!(
            Reference::decode(&doc, "mixed", target),
            Err(MarketError::SchemaViolation { .. })
        ));
    }

    #[tokio::test]
    async fn arrays_resolve_in_stored_order() {
        let (store, resolver) = resolver(Arc::new(MemoryStore::new()));
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            ids.push(
                store
                    .insert(CollectionName::Items, doc! { "name": name }, deadline())
                    .await
                    .unwrap(),
            );
        }
        ids.reverse();
        let parent = doc! { "records": ids.clone() };

        let docs = resolver
            .resolve_field(&parent, "records", CollectionName::Items, deadline())
            .await
            .unwrap()
            .into_documents();
        let names: Vec<&str> = docs.iter().map(|d| d.get_str("name").unwrap()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn empty_array_is_an_empty_sequence() {
        let (_, resolver) = resolver(Arc::new(MemoryStore::new()));
        let parent = doc! { "listings": [] };
        let resolved = resolver
            .resolve_field(&parent, "listings", CollectionName::Listings, deadline())
            .await
            .unwrap();
        assert_eq!(resolved, ResolvedValue::Many(Vec::new()));
    }

    #[tokio::test]
    async fn null_and_absent_fields_differ() {
        let (_, resolver) = resolver(Arc::new(MemoryStore::new()));
        let parent = doc! { "buyer": Bson::Null };
        let resolved = resolver
            .resolve_field(&parent, "buyer", CollectionName::Users, deadline())
            .await
            .unwrap();
        assert_eq!(resolved, ResolvedValue::Null);

        let err = resolver
            .resolve_field(&parent, "seller", CollectionName::Users, deadline())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::SchemaViolation { ref field, .. } if field == "seller"
        ));
    }

    #[tokio::test]
    async fn a_dangling_element_fails_the_whole_resolution() {
        let (store, resolver) = resolver(Arc::new(MemoryStore::new()));
        let present = store
            .insert(CollectionName::Users, doc! {}, deadline())
            .await
            .unwrap();
        let dangling = ObjectId::new();
        let parent = doc! { "users": [present, dangling] };
        let err = resolver
            .resolve_field(&parent, "users", CollectionName::Users, deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::ReferenceNotFound { id, .. } if id == dangling));

        let single = doc! { "seller": dangling };
        assert!(matches!(
            resolver
                .resolve_field(&single, "seller", CollectionName::Users, deadline())
                .await,
            Err(MarketError::ReferenceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn each_lookup_has_its_own_short_deadline() {
        let backend = Arc::new(MemoryStore::new());
        let store = EntityStore::new(backend.clone());
        let id = store
            .insert(CollectionName::Users, doc! {}, deadline())
            .await
            .unwrap();
        backend.set_latency(Some(Duration::from_millis(200))).await;
        let resolver = GraphResolver::new(store, Duration::from_millis(20));

        let parent = doc! { "seller": id };
        let err = resolver
            .resolve_field(&parent, "seller", CollectionName::Users, deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Timeout { .. }));
    }

    #[tokio::test]
    async fn expand_replaces_fields_and_rejects_unknown_ones() {
        let (store, resolver) = resolver(Arc::new(MemoryStore::new()));
        let buyer = store
            .insert(CollectionName::Users, doc! { "discordID": 7 }, deadline())
            .await
            .unwrap();
        let listing = ObjectId::new();
        let inquiry = doc! {
            "note": Bson::Null,
            "accepted": Bson::Null,
            "declined": Bson::Null,
            "deleted": false,
            "buyer": buyer,
            "listing": listing,
        };

        let expanded = resolver
            .expand(EntityKind::ListingInquiry, inquiry.clone(), &["buyer"], deadline())
            .await
            .unwrap();
        assert_eq!(
            expanded.get_document("buyer").unwrap().get_i32("discordID").unwrap(),
            7
        );
        assert_eq!(expanded.get_object_id("listing").unwrap(), listing);

        let err = resolver
            .expand(EntityKind::ListingInquiry, inquiry, &["note"], deadline())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::SchemaViolation {
                collection: CollectionName::Inquiries,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn expand_enforces_relation_cardinality() {
        let (store, resolver) = resolver(Arc::new(MemoryStore::new()));
        let seller = store
            .insert(CollectionName::Users, doc! { "discordID": 1 }, deadline())
            .await
            .unwrap();
        let listing = doc! {
            "price": 10,
            "seller": [seller],
            "buyer": Bson::Null,
            "inquiries": Bson::Null,
        };

        let expanded = resolver
            .expand(EntityKind::Listing, listing.clone(), &["buyer"], deadline())
            .await
            .unwrap();
        assert_eq!(expanded.get("buyer"), Some(&Bson::Null));

        for field in ["seller", "inquiries"] {
            let err = resolver
                .expand(EntityKind::Listing, listing.clone(), &[field], deadline())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                MarketError::SchemaViolation { field: ref f, .. } if f == field
            ));
        }

        let required = doc! { "seller": Bson::Null };
        assert!(matches!(
            resolver
                .expand(EntityKind::Listing, required, &["seller"], deadline())
                .await,
            Err(MarketError::SchemaViolation { .. })
        ));
    }

    #[tokio::test]
    async fn typed_resolution_decodes_records() {
        let (store, resolver) = resolver(Arc::new(MemoryStore::new()));
        let buyer = ObjectId::new();
        let listing = ObjectId::new();
        let inquiry = store
            .insert(
                CollectionName::Inquiries,
                doc! {
                    "note": "hi",
                    "accepted": Bson::Null,
                    "declined": Bson::Null,
                    "deleted": false,
                    "buyer": buyer,
                    "listing": listing,
                },
                deadline(),
            )
            .await
            .unwrap();
        let user = doc! { "inquiries": [inquiry] };
        let inquiries: Vec<ListingInquiry> = resolver
            .resolve_many(&user, "inquiries", deadline())
            .await
            .unwrap();
        assert_eq!(inquiries.len(), 1);
        assert_eq!(inquiries[0].note.as_deref(), Some("hi"));
        assert_eq!(inquiries[0].listing, listing);
    }
}
