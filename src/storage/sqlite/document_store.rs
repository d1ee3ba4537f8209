//! SQLite DocumentStore implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::interfaces::document_store::merge_fields;
use crate::interfaces::{
    Document, DocumentKey, DocumentStore, FieldUpdates, Result, StorageError, TransactionBody,
    TransactionError,
};
use crate::storage::schema::{Documents, CREATE_DOCUMENTS_TABLE};

/// SQLite implementation of DocumentStore.
///
/// Each document is one row holding its JSON text. Transactions take the
/// database write lock upfront, so concurrent transactions are serialized.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` in WAL mode.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Create the documents table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_DOCUMENTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch(conn: &mut SqliteConnection, key: &DocumentKey) -> Result<Option<Document>> {
        let query = Query::select()
            .column(Documents::Data)
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(key.collection.as_str()))
            .and_where(Expr::col(Documents::Id).eq(key.id.as_str()))
            .to_string(SqliteQueryBuilder);

        let Some(row) = sqlx::query(&query).fetch_optional(&mut *conn).await? else {
            return Ok(None);
        };
        let data: String = row.get("data");
        match serde_json::from_str(&data)? {
            serde_json::Value::Object(document) => Ok(Some(document)),
            _ => Err(StorageError::NotAnObject(key.clone())),
        }
    }

    async fn upsert(conn: &mut SqliteConnection, key: &DocumentKey, document: &Document) -> Result<()> {
        let data = serde_json::to_string(document)?;
        let query = Query::insert()
            .into_table(Documents::Table)
            .columns([
                Documents::Collection,
                Documents::Id,
                Documents::Data,
                Documents::UpdatedAt,
            ])
            .values_panic([
                key.collection.as_str().into(),
                key.id.as_str().into(),
                data.into(),
                Utc::now().to_rfc3339().into(),
            ])
            .on_conflict(
                OnConflict::columns([Documents::Collection, Documents::Id])
                    .update_columns([Documents::Data, Documents::UpdatedAt])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;
        Ok(())
    }

    async fn merge_existing(
        conn: &mut SqliteConnection,
        key: &DocumentKey,
        fields: FieldUpdates,
    ) -> Result<()> {
        let mut document = Self::fetch(conn, key)
            .await?
            .ok_or_else(|| StorageError::NotFound(key.clone()))?;
        merge_fields(&mut document, fields);
        Self::upsert(conn, key, &document).await
    }

    /// Body of a read-modify-write, run after `BEGIN IMMEDIATE`.
    async fn transact(
        conn: &mut SqliteConnection,
        key: &DocumentKey,
        body: TransactionBody<'_>,
    ) -> std::result::Result<Document, TransactionError> {
        let current = Self::fetch(conn, key).await?;
        let updates = body(current.as_ref()).map_err(TransactionError::Aborted)?;

        let mut document = current.unwrap_or_default();
        merge_fields(&mut document, updates);
        Self::upsert(conn, key, &document).await?;
        Ok(document)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, key).await
    }

    async fn set(&self, key: &DocumentKey, document: Document) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert(&mut conn, key, &document).await
    }

    async fn update_fields(&self, key: &DocumentKey, fields: FieldUpdates) -> Result<()> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Self::merge_existing(&mut *tx, key, fields).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn run_transaction(
        &self,
        key: &DocumentKey,
        body: TransactionBody<'_>,
    ) -> std::result::Result<Document, TransactionError> {
        // BEGIN IMMEDIATE takes the write lock before the read, so a second
        // transaction on this key waits and then reads the first one's write.
        // Dropping `tx` before commit (error or cancelled request) rolls back.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(StorageError::from)?;

        let document = Self::transact(&mut *tx, key, body).await?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::Barrier;

    use super::*;
    use crate::dispatch::Rejection;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn key() -> DocumentKey {
        DocumentKey::new("businesses/b1/orders", "o1")
    }

    async fn store(dir: &tempfile::TempDir) -> SqliteDocumentStore {
        SqliteDocumentStore::connect(dir.path().join("dispatch.db"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_get_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        assert!(store.get(&key()).await.unwrap().is_none());
        store
            .set(&key(), doc(json!({ "status": "ready", "items": [1, 2] })))
            .await
            .unwrap();
        store
            .update_fields(&key(), doc(json!({ "status": "preparing" })))
            .await
            .unwrap();

        let found = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(found["status"], "preparing");
        assert_eq!(found["items"], json!([1, 2]));
    }

    #[tokio::test]
    async fn test_update_fields_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let result = store
            .update_fields(&key(), doc(json!({ "status": "ready" })))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(store.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_aborted_transaction_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.set(&key(), doc(json!({ "status": "ready" }))).await.unwrap();

        let result = store
            .run_transaction(
                &key(),
                Box::new(|_: Option<&Document>| Err(Rejection::NotAssigned)),
            )
            .await;

        assert!(matches!(
            result,
            Err(TransactionError::Aborted(Rejection::NotAssigned))
        ));
        assert_eq!(store.get(&key()).await.unwrap().unwrap()["status"], "ready");

        // The connection is usable again after the rollback.
        store
            .run_transaction(
                &key(),
                Box::new(|_: Option<&Document>| Ok(doc(json!({ "status": "pending" })))),
            )
            .await
            .unwrap();
        assert_eq!(store.get(&key()).await.unwrap().unwrap()["status"], "pending");
    }

    async fn bump(store: &SqliteDocumentStore) -> std::result::Result<Document, TransactionError> {
        store
            .run_transaction(
                &key(),
                Box::new(|current: Option<&Document>| {
                    let count = current
                        .and_then(|d| d.get("count"))
                        .and_then(|c| c.as_u64())
                        .unwrap_or(0);
                    Ok(doc(json!({ "count": count + 1 })))
                }),
            )
            .await
    }

    #[tokio::test]
    async fn test_cancelled_transaction_releases_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.set(&key(), doc(json!({ "count": 0 }))).await.unwrap();

        // Cut the transaction off at increasing points between BEGIN and COMMIT.
        for i in 0..40u64 {
            let _ = tokio::time::timeout(Duration::from_micros(i * 5), bump(&store)).await;

            let next = tokio::time::timeout(Duration::from_secs(3), bump(&store))
                .await
                .unwrap_or_else(|_| panic!("transaction after cancellation {i} hung"));
            assert!(next.is_ok(), "transaction after cancellation {i} failed");
        }

        store
            .update_fields(&key(), doc(json!({ "status": "ready" })))
            .await
            .unwrap();
        let found = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(found["status"], "ready");
        assert!(found["count"].as_u64().unwrap() >= 40);
    }

    #[tokio::test]
    async fn test_cancelled_update_fields_releases_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.set(&key(), doc(json!({ "status": "ready" }))).await.unwrap();

        for i in 0..40u64 {
            let _ = tokio::time::timeout(
                Duration::from_micros(i * 5),
                store.update_fields(&key(), doc(json!({ "status": "preparing" }))),
            )
            .await;

            tokio::time::timeout(Duration::from_secs(3), bump(&store))
                .await
                .unwrap_or_else(|_| panic!("transaction after cancellation {i} hung"))
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store(&dir).await;
            store.set(&key(), doc(json!({ "status": "ready" }))).await.unwrap();
        }
        let reopened = store(&dir).await;
        assert_eq!(reopened.get(&key()).await.unwrap().unwrap()["status"], "ready");
    }

    #[tokio::test]
    async fn test_concurrent_transactions_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store(&dir).await);
        store.set(&key(), doc(json!({ "count": 0 }))).await.unwrap();
        let barrier = Arc::new(Barrier::new(4));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                store
                    .run_transaction(
                        &key(),
                        Box::new(|current: Option<&Document>| {
                            let count = current
                                .and_then(|d| d.get("count"))
                                .and_then(|c| c.as_u64())
                                .unwrap_or(0);
                            Ok(doc(json!({ "count": count + 1 })))
                        }),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get(&key()).await.unwrap().unwrap()["count"], 4);
    }
}
