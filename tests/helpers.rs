// Shared test helpers for import tests.
//
// Each test gets its own temp directory holding the CSV input and the SQLite
// database file.

use std::path::{Path, PathBuf};

use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

use typed_import::storage::fetch_documents;
use typed_import::Config;

/// Writes `contents` to `name` inside `dir` and returns the path.
#[allow(dead_code)] // Used by other test files
pub fn write_csv(dir: &TempDir, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write test CSV");
    path
}

/// Import config pointing at `file`, with its database inside `dir`.
#[allow(dead_code)] // Used by other test files
pub fn import_config(dir: &TempDir, file: &Path, fields: &[&str], types: &[&str]) -> Config {
    Config {
        file: file.to_path_buf(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
        types: types.iter().map(|t| t.to_string()).collect(),
        db_path: dir.path().join("import.db"),
        collection: "people".to_string(),
        ..Default::default()
    }
}

/// Opens an existing database file written by an import.
#[allow(dead_code)] // Used by other test files
pub async fn open_pool(db_path: &Path) -> SqlitePool {
    SqlitePool::connect(&format!("sqlite:{}", db_path.to_string_lossy()))
        .await
        .expect("Failed to open test database")
}

/// All documents in `collection`, in insertion order.
#[allow(dead_code)] // Used by other test files
pub async fn collection_documents(db_path: &Path, collection: &str) -> Vec<Value> {
    let pool = open_pool(db_path).await;
    let docs = fetch_documents(&pool, collection)
        .await
        .expect("Failed to fetch documents");
    pool.close().await;
    docs
}
