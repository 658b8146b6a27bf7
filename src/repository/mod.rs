pub mod deadline;
pub mod document_store;
pub mod entity_store;
pub mod graph_resolver;
pub mod memory_store;
pub mod mongo_store;
pub mod reference_indexer;

pub use deadline::Deadline;
pub use document_store::DocumentStore;
pub use entity_store::EntityStore;
pub use graph_resolver::{GraphResolver, Reference, ResolvedValue};
pub use memory_store::{MemoryStore, StoreOp};
pub use mongo_store::MongoStore;
pub use reference_indexer::ReferenceIndexer;
