//! In-memory document store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::document_store::merge_fields;
use crate::interfaces::{
    Document, DocumentKey, DocumentStore, FieldUpdates, Result, StorageError, TransactionBody,
    TransactionError,
};

/// Document store backed by a `HashMap`.
///
/// Transactions hold the write lock for their whole body, so transactions
/// on any key are fully serialized.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentKey, Document>>,
    unavailable: RwLock<bool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StorageError::Unavailable`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    async fn check_available(&self) -> Result<()> {
        if *self.unavailable.read().await {
            return Err(StorageError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        self.check_available().await?;
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &DocumentKey, document: Document) -> Result<()> {
        self.check_available().await?;
        self.documents.write().await.insert(key.clone(), document);
        Ok(())
    }

    async fn update_fields(&self, key: &DocumentKey, fields: FieldUpdates) -> Result<()> {
        self.check_available().await?;
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(key)
            .ok_or_else(|| StorageError::NotFound(key.clone()))?;
        merge_fields(document, fields);
        Ok(())
    }

    async fn run_transaction(
        &self,
        key: &DocumentKey,
        body: TransactionBody<'_>,
    ) -> std::result::Result<Document, TransactionError> {
        self.check_available().await?;
        let mut documents = self.documents.write().await;

        let current = documents.get(key);
        let updates = body(current).map_err(TransactionError::Aborted)?;

        let mut document = current.cloned().unwrap_or_default();
        merge_fields(&mut document, updates);
        documents.insert(key.clone(), document.clone());
        Ok(document)
    }
}
