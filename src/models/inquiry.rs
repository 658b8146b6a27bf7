use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

/// A buyer's interest in a listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingInquiry {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    pub note: Option<String>,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub accepted: Option<DateTime>,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub declined: Option<DateTime>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub buyer: ObjectId,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub listing: ObjectId,
}

impl ListingInquiry {
    /// Still counts towards the one-open-inquiry-per-listing rule.
    pub fn is_open(&self) -> bool {
        !self.deleted
    }
}

impl Entity for ListingInquiry {
    const KIND: EntityKind = EntityKind::ListingInquiry;

    fn id(&self) -> ObjectId {
        self.id
    }
}
