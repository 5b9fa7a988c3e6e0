pub mod document_store;
pub mod json_store;
pub mod snapshots;

pub use document_store::{DocumentStore, MemoryStore};
pub use json_store::JsonFileStore;
pub use snapshots::{snapshot_doc_id, SnapshotRepository};
