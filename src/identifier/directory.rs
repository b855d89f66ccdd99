use crate::core::{DatabaseId, NameString, ServerId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name resolution for servers.
#[async_trait]
pub trait ServerDirectory: Send + Sync {
    /// Returns the name of a server, or `None` once it has been permanently removed.
    async fn server_name(&self, server_id: ServerId) -> Option<NameString>;

    /// Returns every live server carrying `name`.
    async fn servers_named(&self, name: &NameString) -> Vec<ServerId>;

    /// Returns every live server, sorted by id.
    async fn live_servers(&self) -> Vec<ServerId>;
}

/// Name resolution for databases.
#[async_trait]
pub trait DatabaseDirectory: Send + Sync {
    /// Returns the name of a database, or `None` if it was deleted.
    async fn database_name(&self, database_id: DatabaseId) -> Option<NameString>;

    /// Returns every live database carrying `name`.
    async fn databases_named(&self, name: &NameString) -> Vec<DatabaseId>;
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    name: NameString,
    removed: bool,
}

/// Shared bookkeeping behind both in-memory directories.
#[derive(Debug)]
struct NameTable<K: Ord> {
    entries: RwLock<BTreeMap<K, DirectoryEntry>>,
}

impl<K: Ord> Default for NameTable<K> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Copy> NameTable<K> {
    async fn insert(&self, id: K, name: NameString) {
        self.entries.write().await.insert(
            id,
            DirectoryEntry {
                name,
                removed: false,
            },
        );
    }

    async fn remove(&self, id: K) -> bool {
        match self.entries.write().await.get_mut(&id) {
            Some(entry) if !entry.removed => {
                entry.removed = true;
                true
            }
            _ => false,
        }
    }


    async fn name_of(&self, id: K) -> Option<NameString> {
        self.entries
            .read()
            .await
            .get(&id)
            .filter(|entry| !entry.removed)
            .map(|entry| entry.name.clone())
    }

    async fn ids_named(&self, name: &NameString) -> Vec<K> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| !entry.removed && &entry.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    async fn live_ids(&self) -> Vec<K> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| !entry.removed)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// In-memory server directory.
///
/// Removed servers stay known by id (so they can be reported as removed) but
/// no longer resolve in either direction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServerDirectory {
    table: Arc<NameTable<ServerId>>,
}

impl InMemoryServerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_server(&self, server_id: ServerId, name: NameString) {
        self.table.insert(server_id, name).await;
    }

    /// Permanently removes a server. Returns false if it was unknown or already removed.
    pub async fn remove_server(&self, server_id: ServerId) -> bool {
        self.table.remove(server_id).await
    }
}

#[async_trait]
impl ServerDirectory for InMemoryServerDirectory {
    async fn server_name(&self, server_id: ServerId) -> Option<NameString> {
        self.table.name_of(server_id).await
    }

    async fn servers_named(&self, name: &NameString) -> Vec<ServerId> {
        self.table.ids_named(name).await
    }

    async fn live_servers(&self) -> Vec<ServerId> {
        self.table.live_ids().await
    }
}

/// In-memory database directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabaseDirectory {
    table: Arc<NameTable<DatabaseId>>,
}

impl InMemoryDatabaseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_database(&self, database_id: DatabaseId, name: NameString) {
        self.table.insert(database_id, name).await;
    }

    pub async fn remove_database(&self, database_id: DatabaseId) -> bool {
        self.table.remove(database_id).await
    }
}

#[async_trait]
impl DatabaseDirectory for InMemoryDatabaseDirectory {
    async fn database_name(&self, database_id: DatabaseId) -> Option<NameString> {
        self.table.name_of(database_id).await
    }

    async fn databases_named(&self, name: &NameString) -> Vec<DatabaseId> {
        self.table.ids_named(name).await
    }
}
