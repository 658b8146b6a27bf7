use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

/// Lowest price a listing may ask.
pub const MIN_PRICE: i64 = 0;
/// Highest price a listing may ask.
pub const MAX_PRICE: i64 = 100_000_000;

/// A seller offering one item at a price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    pub price: i64,
    pub deleted: bool,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub accepted: Option<DateTime>,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub seller: ObjectId,
    #[serde(serialize_with = "serde_fmt::optional_object_id")]
    pub buyer: Option<ObjectId>,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub item: ObjectId,
    #[serde(serialize_with = "serde_fmt::object_ids")]
    pub inquiries: Vec<ObjectId>,
}

impl Listing {
    pub fn price_in_bounds(price: i64) -> bool {
        (MIN_PRICE..=MAX_PRICE).contains(&price)
    }
}

impl Entity for Listing {
    const KIND: EntityKind = EntityKind::Listing;

    fn id(&self) -> ObjectId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_bounds_are_inclusive() {
        assert!(Listing::price_in_bounds(0));
        assert!(Listing::price_in_bounds(100_000_000));
        assert!(!Listing::price_in_bounds(-1));
        assert!(!Listing::price_in_bounds(100_000_001));
    }
}
