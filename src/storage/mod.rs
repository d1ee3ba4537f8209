//! Storage implementations.

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::DocumentStore;

pub mod directory;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use directory::DocumentDirectory;
pub use memory::MemoryDocumentStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Initialize the document store based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error>> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory (documents are lost on exit)");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!("Storage: sqlite at {}", config.sqlite.path);
            if let Some(parent) = std::path::Path::new(&config.sqlite.path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Arc::new(SqliteDocumentStore::connect(&config.sqlite.path).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
    }
}
