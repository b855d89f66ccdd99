#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use tablemeta::identifier::{InMemoryDatabaseDirectory, InMemoryServerDirectory};
use tablemeta::metadata::{InMemoryMetadataStore, MetadataStore, TablesSnapshot};
use tablemeta::{
    BackendSettings, DatabaseId, Document, Interruptor, NameString, ServerId, TableConfigBackend,
    TableId,
};

/// Three servers (`alpha`, `beta`, `gamma`) and two databases (`test`, `other`).
pub struct Cluster {
    pub store: InMemoryMetadataStore,
    pub servers: Arc<InMemoryServerDirectory>,
    pub databases: Arc<InMemoryDatabaseDirectory>,
    pub alpha: ServerId,
    pub beta: ServerId,
    pub gamma: ServerId,
    pub test_db: DatabaseId,
    pub other_db: DatabaseId,
    pub backend: TableConfigBackend,
}

impl Cluster {
    pub async fn new() -> Self {
        Self::with_settings(BackendSettings::default()).await
    }

    pub async fn with_settings(settings: BackendSettings) -> Self {
        let servers = Arc::new(InMemoryServerDirectory::new());
        let alpha = ServerId::generate();
        let beta = ServerId::generate();
        let gamma = ServerId::generate();
        for (id, name) in [(alpha, "alpha"), (beta, "beta"), (gamma, "gamma")] {
            servers.add_server(id, NameString::new(name).unwrap()).await;
        }

        let databases = Arc::new(InMemoryDatabaseDirectory::new());
        let test_db = DatabaseId::generate();
        let other_db = DatabaseId::generate();
        databases
            .add_database(test_db, NameString::new("test").unwrap())
            .await;
        databases
            .add_database(other_db, NameString::new("other").unwrap())
            .await;

        let store = InMemoryMetadataStore::new();
        let backend =
            TableConfigBackend::builder(Arc::new(store.clone()), servers.clone(), databases.clone())
                .settings(settings)
                .build()
                .unwrap();

        Self {
            store,
            servers,
            databases,
            alpha,
            beta,
            gamma,
            test_db,
            other_db,
            backend,
        }
    }

    /// Creates a table under a generated key and returns its id and committed row.
    pub async fn create(&self, name: &str, db: &str) -> (TableId, Document) {
        let id = TableId::generate();
        let mut row = Some(json!({"name": name, "db": db, "id": id.to_string()}));
        self.backend
            .write_row(&key(&id), true, &mut row, &Interruptor::new())
            .await
            .unwrap();
        (id, row.unwrap())
    }

    pub async fn write(
        &self,
        id: &TableId,
        autogenerated: bool,
        row: Option<Document>,
    ) -> tablemeta::Result<Option<Document>> {
        let mut row = row;
        self.backend
            .write_row(&key(id), autogenerated, &mut row, &Interruptor::new())
            .await?;
        Ok(row)
    }

    pub async fn snapshot(&self) -> TablesSnapshot {
        self.store.fetch_snapshot().await
    }
}

pub fn key(id: &TableId) -> Document {
    json!(id.to_string())
}
