//! Typed records for every collection, plus the relationship table that
//! tells the graph resolver where each reference field points.

pub mod identity;
pub mod inquiry;
pub mod item;
pub mod listing;
pub mod record;
pub mod report;
pub mod transaction;
pub mod user;

mod serde_fmt;

use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::MarketError;

pub use inquiry::ListingInquiry;
pub use item::Item;
pub use listing::Listing;
pub use record::ItemMarketRecord;
pub use report::UserReport;
pub use transaction::{Transaction, TransactionState};
pub use user::User;

/// The seven collections of the `acex` database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Items,
    Records,
    Listings,
    Inquiries,
    Transactions,
    Users,
    Reports,
}

impl CollectionName {
    pub const ALL: [CollectionName; 7] = [
        CollectionName::Items,
        CollectionName::Records,
        CollectionName::Listings,
        CollectionName::Inquiries,
        CollectionName::Transactions,
        CollectionName::Users,
        CollectionName::Reports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Items => "items",
            CollectionName::Records => "records",
            CollectionName::Listings => "listings",
            CollectionName::Inquiries => "inquiries",
            CollectionName::Transactions => "transactions",
            CollectionName::Users => "users",
            CollectionName::Reports => "reports",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many documents a reference field may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Optional,
    Many,
}

/// One row of the relationship table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub field: &'static str,
    pub target: CollectionName,
    pub cardinality: Cardinality,
}

const fn rel(field: &'static str, target: CollectionName, cardinality: Cardinality) -> Relation {
    Relation {
        field,
        target,
        cardinality,
    }
}

const USER_RELATIONS: &[Relation] = &[
    rel("listings", CollectionName::Listings, Cardinality::Many),
    rel("inquiries", CollectionName::Inquiries, Cardinality::Many),
    rel("transactions", CollectionName::Transactions, Cardinality::Many),
];

const ITEM_RELATIONS: &[Relation] = &[
    rel("records", CollectionName::Records, Cardinality::Many),
    rel("listings", CollectionName::Listings, Cardinality::Many),
];

const RECORD_RELATIONS: &[Relation] = &[rel("item", CollectionName::Items, Cardinality::One)];

const LISTING_RELATIONS: &[Relation] = &[
    rel("seller", CollectionName::Users, Cardinality::One),
    rel("buyer", CollectionName::Users, Cardinality::Optional),
    rel("item", CollectionName::Items, Cardinality::One),
    rel("inquiries", CollectionName::Inquiries, Cardinality::Many),
];

const INQUIRY_RELATIONS: &[Relation] = &[
    rel("buyer", CollectionName::Users, Cardinality::One),
    rel("listing", CollectionName::Listings, Cardinality::One),
];

const TRANSACTION_RELATIONS: &[Relation] = &[
    rel("listing", CollectionName::Listings, Cardinality::One),
    rel("buyer", CollectionName::Users, Cardinality::One),
    rel("seller", CollectionName::Users, Cardinality::One),
    rel("goesFirst", CollectionName::Users, Cardinality::One),
    rel("unhappyUser", CollectionName::Users, Cardinality::Optional),
];

const REPORT_RELATIONS: &[Relation] = &[
    rel("reporter", CollectionName::Users, Cardinality::One),
    rel("scumbag", CollectionName::Users, Cardinality::One),
];

/// Entity kinds, one per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Item,
    ItemMarketRecord,
    Listing,
    ListingInquiry,
    Transaction,
    UserReport,
}

impl EntityKind {
    pub fn collection(self) -> CollectionName {
        match self {
            EntityKind::User => CollectionName::Users,
            EntityKind::Item => CollectionName::Items,
            EntityKind::ItemMarketRecord => CollectionName::Records,
            EntityKind::Listing => CollectionName::Listings,
            EntityKind::ListingInquiry => CollectionName::Inquiries,
            EntityKind::Transaction => CollectionName::Transactions,
            EntityKind::UserReport => CollectionName::Reports,
        }
    }

    /// Reference fields this kind carries.
    pub fn relations(self) -> &'static [Relation] {
        match self {
            EntityKind::User => USER_RELATIONS,
            EntityKind::Item => ITEM_RELATIONS,
            EntityKind::ItemMarketRecord => RECORD_RELATIONS,
            EntityKind::Listing => LISTING_RELATIONS,
            EntityKind::ListingInquiry => INQUIRY_RELATIONS,
            EntityKind::Transaction => TRANSACTION_RELATIONS,
            EntityKind::UserReport => REPORT_RELATIONS,
        }
    }

    pub fn relation(self, field: &str) -> Option<Relation> {
        self.relations().iter().copied().find(|r| r.field == field)
    }
}

impl FromStr for EntityKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "users" => Ok(EntityKind::User),
            "item" | "items" => Ok(EntityKind::Item),
            "record" | "records" => Ok(EntityKind::ItemMarketRecord),
            "listing" | "listings" => Ok(EntityKind::Listing),
            "inquiry" | "inquiries" => Ok(EntityKind::ListingInquiry),
            "transaction" | "transactions" => Ok(EntityKind::Transaction),
            "report" | "reports" => Ok(EntityKind::UserReport),
            other => Err(MarketError::InvalidArgument(format!(
                "unknown entity kind: {other}"
            ))),
        }
    }
}

/// A record decoded from one document of its collection.
pub trait Entity: DeserializeOwned + Serialize + Send + Sync + Unpin + 'static {
    const KIND: EntityKind;

    /// The store-generated `_id`.
    fn id(&self) -> ObjectId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_relation_targets_a_known_collection() {
        let kinds = [
            EntityKind::User,
            EntityKind::Item,
            EntityKind::ItemMarketRecord,
            EntityKind::Listing,
            EntityKind::ListingInquiry,
            EntityKind::Transaction,
            EntityKind::UserReport,
        ];
        for kind in kinds {
            for relation in kind.relations() {
                assert!(CollectionName::ALL.contains(&relation.target));
            }
        }
    }

    #[test]
    fn listing_relations_resolve_by_name() {
        let seller = EntityKind::Listing.relation("seller").unwrap();
        assert_eq!(seller.target, CollectionName::Users);
        assert_eq!(seller.cardinality, Cardinality::One);
        assert!(EntityKind::Listing.relation("price").is_none());
    }

    #[test]
    fn kinds_parse_singular_and_plural() {
        assert_eq!("listing".parse::<EntityKind>().unwrap(), EntityKind::Listing);
        assert_eq!("reports".parse::<EntityKind>().unwrap(), EntityKind::UserReport);
        assert!(matches!(
            "widgets".parse::<EntityKind>(),
            Err(MarketError::InvalidArgument(_))
        ));
    }
}
