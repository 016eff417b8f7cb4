//! In-memory document store for loader and pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::convert::TypedDocument;
use crate::error_handling::DatabaseError;
use crate::schema::FieldValue;
use crate::storage::DocumentStore;

/// Records every bulk write. Optionally fails the nth call (1-based).
#[derive(Default)]
pub struct MemoryStore {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    batches: Mutex<Vec<Vec<TypedDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(call: usize) -> Self {
        MemoryStore {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .collect()
    }

    pub fn stored(&self) -> usize {
        self.batch_sizes().iter().sum()
    }

    pub fn documents(&self) -> Vec<TypedDocument> {
        self.batches.lock().unwrap().concat()
    }

    /// The `n` field of every stored document, in write order.
    pub fn numbers(&self) -> Vec<i64> {
        self.documents()
            .iter()
            .filter_map(|doc| match doc.get("n") {
                Some(FieldValue::Integer(n)) => Some(*n),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(&self, documents: &[TypedDocument]) -> Result<(), DatabaseError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(DatabaseError::SqlError(sqlx::Error::Protocol(format!(
                "simulated failure on call {}",
                call
            ))));
        }
        self.batches.lock().unwrap().push(documents.to_vec());
        Ok(())
    }
}

pub fn numbered_doc(n: i64) -> TypedDocument {
    TypedDocument::from(vec![("n".to_string(), FieldValue::Integer(n))])
}
