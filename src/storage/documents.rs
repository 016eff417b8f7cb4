//! Document storage.
//!
//! Collections live in a single `documents` table; each row holds one typed
//! document as a JSON object.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::convert::TypedDocument;
use crate::error_handling::DatabaseError;

/// Destination for bulk document writes.
///
/// `insert_many` is all-or-nothing: on error none of the documents are stored.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_many(&self, documents: &[TypedDocument]) -> Result<(), DatabaseError>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn insert_many(&self, documents: &[TypedDocument]) -> Result<(), DatabaseError> {
        (**self).insert_many(documents).await
    }
}

/// SQLite-backed collection.
#[derive(Clone, Debug)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    collection: String,
    run_id: Option<String>,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool, collection: impl Into<String>) -> Self {
        SqliteDocumentStore {
            pool,
            collection: collection.into(),
            run_id: None,
        }
    }

    /// Tags every document written by this store with `run_id`.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert_many(&self, documents: &[TypedDocument]) -> Result<(), DatabaseError> {
        if documents.is_empty() {
            return Ok(());
        }

        let inserted_at_ms = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for document in documents {
            let body = serde_json::to_string(&document.to_json())?;
            sqlx::query(
                "INSERT INTO documents (collection, run_id, body, inserted_at_ms)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&self.collection)
            .bind(self.run_id.as_deref())
            .bind(body)
            .bind(inserted_at_ms)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Deletes every document in `collection`. Returns the number removed.
pub async fn drop_collection(pool: &SqlitePool, collection: &str) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
        .bind(collection)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Number of documents in `collection`.
pub async fn count_documents(pool: &SqlitePool, collection: &str) -> Result<i64, DatabaseError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
        .bind(collection)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// All documents in `collection`, in insertion order.
pub async fn fetch_documents(
    pool: &SqlitePool,
    collection: &str,
) -> Result<Vec<Value>, DatabaseError> {
    let rows = sqlx::query("SELECT body FROM documents WHERE collection = ? ORDER BY id")
        .bind(collection)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            let body: String = row.get("body");
            serde_json::from_str(&body).map_err(DatabaseError::from)
        })
        .collect()
}
