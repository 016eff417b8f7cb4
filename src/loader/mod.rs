//! Batch loader.
//!
//! Buffers converted documents and writes them to a `DocumentStore` in bulk.
//! A bulk write is attempted as soon as the buffer reaches the batch size, so
//! the buffer is never full when the next document arrives.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::convert::TypedDocument;
use crate::error_handling::BatchWriteError;
use crate::storage::DocumentStore;

#[cfg(test)]
pub(crate) mod test_store;

/// Configuration for batch writing
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Number of documents per bulk write
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Batch loader that collects documents and writes them in batches.
///
/// On a failed write the batch stays buffered; the caller decides whether to
/// retry with `flush`, or give up with `discard`.
pub struct BatchLoader<S> {
    store: S,
    config: BatchConfig,
    buffer: Vec<TypedDocument>,
    loaded: usize,
    batches_flushed: usize,
}

impl<S: DocumentStore> BatchLoader<S> {
    pub fn new(store: S, config: BatchConfig) -> Self {
        let batch_size = config.batch_size.max(1);
        BatchLoader {
            store,
            config: BatchConfig { batch_size },
            buffer: Vec::with_capacity(batch_size),
            loaded: 0,
            batches_flushed: 0,
        }
    }

    /// Appends a document and flushes once the batch is full.
    ///
    /// The document is part of the batch even if the flush fails.
    pub async fn add(&mut self, document: TypedDocument) -> Result<(), BatchWriteError> {
        self.buffer.push(document);

        if self.buffer.len() >= self.config.batch_size {
            self.flush().await?;
        }

        Ok(())
    }

    /// Writes the buffered batch as a single bulk write.
    ///
    /// Returns the number of documents written; an empty buffer is a no-op
    /// that never reaches the store.
    pub async fn flush(&mut self) -> Result<usize, BatchWriteError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let count = self.buffer.len();
        log::debug!("Flushing batch of {} documents", count);

        match self.store.insert_many(&self.buffer).await {
            Ok(()) => {
                self.buffer.clear();
                self.loaded += count;
                self.batches_flushed += 1;
                log::debug!(
                    "Flushed {} documents ({} loaded in {} batches)",
                    count,
                    self.loaded,
                    self.batches_flushed
                );
                Ok(count)
            }
            Err(source) => {
                log::error!("Bulk write of {} documents failed: {}", count, source);
                Err(BatchWriteError { count, source })
            }
        }
    }

    /// Drops a batch that will not be retried. Returns how many documents it held.
    pub fn discard(&mut self) -> usize {
        let count = self.buffer.len();
        if count > 0 {
            log::warn!("Discarding {} unflushed documents", count);
        }
        self.buffer.clear();
        count
    }

    /// Documents waiting in the current batch.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Documents successfully written so far.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Successful bulk writes so far.
    pub fn batches_flushed(&self) -> usize {
        self.batches_flushed
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
