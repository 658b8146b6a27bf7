//! External identifiers and creation times, both read off the `_id`
//! ObjectId. Nothing here touches the store: a document carries its own
//! identity, and its creation instant is the timestamp embedded in `_id`.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde::Serialize;

use crate::error::{MarketError, Result};
use crate::models::{serde_fmt, Entity};

/// The native key of `doc`.
pub fn object_id(doc: &Document) -> Result<ObjectId> {
    match doc.get("_id") {
        Some(Bson::ObjectId(id)) => Ok(*id),
        Some(other) => Err(MarketError::MalformedDocument(format!(
            "_id is a {:?}, expected an ObjectId",
            other.element_type()
        ))),
        None => Err(MarketError::MalformedDocument(
            "document has no _id".to_string(),
        )),
    }
}

/// Presentation id: the 24-char lowercase hex form of `_id`.
pub fn external_id(doc: &Document) -> Result<String> {
    object_id(doc).map(|id| id.to_hex())
}

/// Creation instant embedded in `_id`, to the second.
pub fn created_at(doc: &Document) -> Result<DateTime<Utc>> {
    object_id(doc).map(|id| created_at_of(&id))
}

pub fn created_at_of(id: &ObjectId) -> DateTime<Utc> {
    id.timestamp().to_chrono()
}

/// Decodes an external id coming in from a caller.
pub fn parse_id(external: &str) -> Result<ObjectId> {
    ObjectId::parse_str(external.trim())
        .map_err(|e| MarketError::InvalidArgument(format!("invalid id {external:?}: {e}")))
}

/// JSON form of a raw document: `_id` becomes `id`, a derived `created`
/// is added, and nested ids and datetimes become strings. Resolved
/// children get the same treatment.
pub fn present(doc: Document) -> Result<serde_json::Value> {
    Ok(Bson::Document(present_document(doc)?).into_relaxed_extjson())
}

fn present_document(doc: Document) -> Result<Document> {
    let mut out = Document::new();
    if doc.contains_key("_id") {
        let id = object_id(&doc)?;
        out.insert("id", id.to_hex());
        out.insert("created", created_at_of(&id).to_rfc3339());
    }
    for (key, value) in doc {
        if key == "_id" {
            continue;
        }
        out.insert(key, present_value(value)?);
    }
    Ok(out)
}

fn present_value(value: Bson) -> Result<Bson> {
    Ok(match value {
        Bson::ObjectId(id) => Bson::String(id.to_hex()),
        Bson::DateTime(dt) => Bson::String(dt.to_chrono().to_rfc3339()),
        Bson::Document(doc) => Bson::Document(present_document(doc)?),
        Bson::Array(values) => Bson::Array(
            values
                .into_iter()
                .map(present_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        other => other,
    })
}

/// A typed record with its derived `id` and `created` fields.
#[derive(Debug, Clone, Serialize)]
pub struct Presented<T> {
    pub id: String,
    #[serde(serialize_with = "serde_fmt::utc")]
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub entity: T,
}

impl<T: Entity> Presented<T> {
    pub fn new(entity: T) -> Self {
        let id = entity.id();
        Presented {
            id: id.to_hex(),
            created: created_at_of(&id),
            entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn external_id_is_hex_of_object_id() {
        let id = ObjectId::parse_str("5f1d7a2b9c1e4a0012345678").unwrap();
        let doc = doc! { "_id": id, "name": "Rock" };
        assert_eq!(external_id(&doc).unwrap(), "5f1d7a2b9c1e4a0012345678");
    }

    #[test]
    fn created_at_comes_from_the_key() {
        // 0x5f1d7a2b = 1595767339
        let id = ObjectId::parse_str("5f1d7a2b9c1e4a0012345678").unwrap();
        let doc = doc! { "_id": id };
        assert_eq!(created_at(&doc).unwrap().timestamp(), 1_595_767_339);
    }

    #[test]
    fn missing_or_foreign_key_is_malformed() {
        let no_key = doc! { "name": "Rock" };
        assert!(matches!(
            external_id(&no_key),
            Err(MarketError::MalformedDocument(_))
        ));

        let string_key = doc! { "_id": "5f1d7a2b9c1e4a0012345678" };
        assert!(matches!(
            created_at(&string_key),
            Err(MarketError::MalformedDocument(_))
        ));
    }

    #[test]
    fn parse_id_rejects_non_hex() {
        assert!(parse_id("5f1d7a2b9c1e4a0012345678").is_ok());
        assert!(matches!(
            parse_id("not-an-id"),
            Err(MarketError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_id("5f1d7a2b9c1e4a00123456"),
            Err(MarketError::InvalidArgument(_))
        ));
    }

    #[test]
    fn present_rewrites_ids_recursively() {
        let parent = ObjectId::new();
        let child = ObjectId::new();
        let seller = ObjectId::new();
        let doc = doc! {
            "_id": parent,
            "price": 10,
            "seller": seller,
            "item": { "_id": child, "name": "Rock" },
        };
        let json = present(doc).unwrap();
        assert_eq!(json["id"], parent.to_hex());
        assert_eq!(json["seller"], seller.to_hex());
        assert_eq!(json["item"]["id"], child.to_hex());
        assert_eq!(json["item"]["name"], "Rock");
        assert!(json.get("_id").is_none());
        assert!(json["created"].is_string());
    }
}
