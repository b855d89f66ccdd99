//! Table configurations exposed as documents.
//!
//! Every table in the cluster appears as one row:
//!
//! ```json
//! {
//!     "name": "users",
//!     "db": "test",
//!     "id": "2f4c9a3e-6a0e-4b8e-9d5e-6f3b1c1a9a21",
//!     "primary_key": "id",
//!     "shards": [{ "replicas": ["alpha", "beta"], "director": "alpha" }]
//! }
//! ```
//!
//! Rows are written through [`TableConfigBackend::write_row`]. A new table
//! only needs `name`, `db` and `id`; `primary_key` and `shards` are filled
//! in and written back to the caller's document.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tablemeta::identifier::{InMemoryDatabaseDirectory, InMemoryServerDirectory};
//! use tablemeta::metadata::InMemoryMetadataStore;
//! use tablemeta::{DatabaseId, Interruptor, NameString, ServerId, TableConfigBackend, TableId};
//!
//! # #[tokio::main]
//! # async fn main() -> tablemeta::Result<()> {
//! let servers = Arc::new(InMemoryServerDirectory::new());
//! servers.add_server(ServerId::generate(), NameString::new("alpha")?).await;
//! let databases = Arc::new(InMemoryDatabaseDirectory::new());
//! databases.add_database(DatabaseId::generate(), NameString::new("test")?).await;
//!
//! let backend = TableConfigBackend::builder(
//!     Arc::new(InMemoryMetadataStore::new()),
//!     servers,
//!     databases,
//! )
//! .build()?;
//!
//! let id = TableId::generate();
//! let mut row = Some(json!({ "name": "users", "db": "test", "id": id.to_string() }));
//! backend
//!     .write_row(&json!(id.to_string()), true, &mut row, &Interruptor::new())
//!     .await?;
//!
//! let row = row.unwrap();
//! assert_eq!(row["primary_key"], "id");
//! assert_eq!(row["shards"][0]["director"], "alpha");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// tablemeta Library
// ============================================================================

pub mod backend;
pub mod config;
pub mod core;
pub mod document;
pub mod identifier;
pub mod interrupt;
pub mod metadata;
pub mod planner;
pub mod settings;

// Re-export main types for convenience
pub use backend::{ConfigChange, ReconfigureOutcome, TableConfigBackend, TableConfigBackendBuilder};
pub use core::{ConfigError, DatabaseId, NameString, Result, ServerId, TableId};
pub use document::Document;
pub use identifier::IdentifierFormat;
pub use interrupt::Interruptor;
pub use settings::BackendSettings;
