// JSON presentation of BSON-native fields. Deserialization stays the BSON
// default so records decode straight from stored documents.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::ser::SerializeSeq;
use serde::Serializer;

pub fn object_id<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&id.to_hex())
}

pub fn optional_object_id<S: Serializer>(
    id: &Option<ObjectId>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.serialize_str(&id.to_hex()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::ptr_arg)]
pub fn object_ids<S: Serializer>(ids: &Vec<ObjectId>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(ids.len()))?;
    for id in ids {
        seq.serialize_element(&id.to_hex())?;
    }
    seq.end()
}

pub fn datetime<S: Serializer>(dt: &DateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_chrono().to_rfc3339())
}

pub fn optional_datetime<S: Serializer>(
    dt: &Option<DateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match dt {
        Some(dt) => serializer.serialize_str(&dt.to_chrono().to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

pub fn utc<S: Serializer>(dt: &chrono::DateTime<chrono::Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339())
}
