//! SQLite implementations of storage interfaces.

mod document_store;

pub use document_store::SqliteDocumentStore;
