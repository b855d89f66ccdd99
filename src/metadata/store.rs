use super::snapshot::TablesSnapshot;
use super::versioned::Join;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// The cluster-wide table metadata. Reads hand out an immutable snapshot;
/// writes are convergent joins, never blind overwrites.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn fetch_snapshot(&self) -> TablesSnapshot;

    /// Merges `snapshot` into the store. Never fails; a concurrent join may
    /// supersede individual fields according to their versions.
    async fn join(&self, snapshot: TablesSnapshot);
}

/// In-memory store backed by a single shared snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataStore {
    state: Arc<RwLock<TablesSnapshot>>,
    joins: Arc<AtomicU64>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: TablesSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
            joins: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of joins applied since construction.
    pub fn join_count(&self) -> u64 {
        self.joins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn fetch_snapshot(&self) -> TablesSnapshot {
        self.state.read().await.clone()
    }

    async fn join(&self, snapshot: TablesSnapshot) {
        let mut state = self.state.write().await;
        state.join(&snapshot);
        self.joins.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DatabaseId, NameString, TableId};
    use crate::metadata::{Deletable, ReplicationInfo, TableRecord};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_join_does_not_drop_concurrent_changes() {
        let store = InMemoryMetadataStore::new();
        let node = Uuid::new_v4();

        let mut first = store.fetch_snapshot().await;
        let mut second = store.fetch_snapshot().await;

        let a = TableId::generate();
        let b = TableId::generate();
        let db = DatabaseId::generate();
        first.insert(
            a,
            Deletable::Live(TableRecord::new(
                NameString::new("a").unwrap(),
                db,
                "id".into(),
                ReplicationInfo::default(),
                node,
            )),
        );
        second.insert(
            b,
            Deletable::Live(TableRecord::new(
                NameString::new("b").unwrap(),
                db,
                "id".into(),
                ReplicationInfo::default(),
                node,
            )),
        );

        store.join(first).await;
        store.join(second).await;

        let merged = store.fetch_snapshot().await;
        assert!(merged.live(&a).is_some());
        assert!(merged.live(&b).is_some());
        assert_eq!(store.join_count(), 2);
    }
}
