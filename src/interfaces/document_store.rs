//! Document storage interface.

use std::fmt;

use async_trait::async_trait;

use crate::dispatch::Rejection;

/// A schemaless stored document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Top-level fields to merge into a document. Nested objects are replaced
/// wholesale, not deep-merged.
pub type FieldUpdates = serde_json::Map<String, serde_json::Value>;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(DocumentKey),

    #[error("Stored document is not a JSON object: {0}")]
    NotAnObject(DocumentKey),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a failed transaction.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The body rejected the current state; nothing was written.
    #[error("transaction aborted: {0}")]
    Aborted(Rejection),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Address of a document: collection path plus id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Transaction body: sees the current document (if any) and returns the
/// fields to merge, or a rejection that aborts the transaction.
pub type TransactionBody<'a> = Box<
    dyn FnOnce(Option<&Document>) -> std::result::Result<FieldUpdates, Rejection> + Send + 'a,
>;

/// Interface for document persistence.
///
/// Implementations:
/// - `MemoryDocumentStore`: in-process, for tests and local development
/// - `SqliteDocumentStore`: SQLite storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document outside any transaction. Staleness is acceptable.
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>>;

    /// Create or replace a document.
    async fn set(&self, key: &DocumentKey, document: Document) -> Result<()>;

    /// Merge top-level fields into an existing document.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update_fields(&self, key: &DocumentKey, fields: FieldUpdates) -> Result<()>;

    /// Read-modify-write one document atomically.
    ///
    /// Concurrent transactions on the same key are serialized: the body of
    /// the second observes the first one's committed write. On `Ok` the
    /// merged document has been committed and is returned; on `Err` nothing
    /// was written.
    async fn run_transaction(
        &self,
        key: &DocumentKey,
        body: TransactionBody<'_>,
    ) -> std::result::Result<Document, TransactionError>;
}

/// Shallow-merge `fields` into `document`.
pub fn merge_fields(document: &mut Document, fields: FieldUpdates) {
    for (name, value) in fields {
        document.insert(name, value);
    }
}
