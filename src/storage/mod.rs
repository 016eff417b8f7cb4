// storage/mod.rs
// Database operations module

pub mod documents;
pub mod migrations;
pub mod pool;
pub mod run;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use documents::{
    count_documents, drop_collection, fetch_documents, DocumentStore, SqliteDocumentStore,
};
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use run::{
    insert_run_metadata, query_run_history, update_run_stats, RunMetadata, RunStats, RunSummary,
};
