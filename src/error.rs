//! Error type shared by the store, the reference layer and the workflows.

use mongodb::bson::oid::ObjectId;

use crate::models::CollectionName;

/// Everything an operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// A missing, malformed or out-of-range argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The entity an operation was asked to act on does not exist.
    #[error("{collection} document not found: {key}")]
    NotFound {
        /// Collection that was searched.
        collection: CollectionName,
        /// Id or other lookup key that matched nothing.
        key: String,
    },

    /// A uniqueness rule would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request is well formed but not allowed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A store call did not finish before its deadline.
    #[error("deadline exceeded during {operation}")]
    Timeout {
        /// Name of the store call that was cut off.
        operation: &'static str,
    },

    /// A stored reference points at a document that is gone.
    #[error("db.{collection} has no document {id}")]
    ReferenceNotFound {
        /// Collection the reference points into.
        collection: CollectionName,
        /// The dangling id.
        id: ObjectId,
    },

    /// A relationship field is missing or holds something other than ids.
    #[error("invalid param for extraction from db.{collection}: {field}")]
    SchemaViolation {
        /// Collection the field would have resolved into.
        collection: CollectionName,
        /// The offending field name.
        field: String,
    },

    /// A document could not be decoded or lacks a usable `_id`.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The MongoDB driver reported an error.
    #[error("MongoDB error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A non-driver backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl MarketError {
    pub(crate) fn not_found(collection: CollectionName, key: impl ToString) -> Self {
        Self::NotFound {
            collection,
            key: key.to_string(),
        }
    }
}

impl From<mongodb::bson::de::Error> for MarketError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T, E = MarketError> = std::result::Result<T, E>;
