use super::versioned::{Join, Versioned};
use crate::core::{DatabaseId, NameString, ServerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Primary key used when a new table does not name one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Replica set of one shard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShardConfig {
    pub replicas: BTreeSet<ServerId>,
    /// `None` means there is no currently known director.
    pub director: Option<ServerId>,
}

impl ShardConfig {
    pub fn new(replicas: impl IntoIterator<Item = ServerId>, director: Option<ServerId>) -> Self {
        Self {
            replicas: replicas.into_iter().collect(),
            director,
        }
    }
}

/// Ordered shards of a table. Key ranges live in the [`ShardScheme`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableConfig {
    pub shards: Vec<ShardConfig>,
}

impl TableConfig {
    /// Adds one to `usage` for every replica assignment in this config.
    pub fn tally_server_usage(&self, usage: &mut BTreeMap<ServerId, usize>) {
        for shard in &self.shards {
            for replica in &shard.replicas {
                *usage.entry(*replica).or_default() += 1;
            }
        }
    }
}

/// A boundary key between two adjacent shards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitPoint(pub String);

/// Ordered split points partitioning the keyspace; `n` points make `n + 1` shards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShardScheme {
    pub split_points: Vec<SplitPoint>,
}

impl ShardScheme {
    /// The trivial scheme: a single shard covering every key.
    pub fn one_shard() -> Self {
        Self::default()
    }

    pub fn num_shards(&self) -> usize {
        self.split_points.len() + 1
    }

    /// Split points must be strictly increasing.
    pub fn is_well_formed(&self) -> bool {
        self.split_points.windows(2).all(|pair| pair[0] < pair[1])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplicationInfo {
    pub config: TableConfig,
    pub shard_scheme: ShardScheme,
}

/// Cluster-visible record of one table. Every field is versioned
/// independently so concurrent edits of different fields converge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub name: Versioned<NameString>,
    pub database: Versioned<DatabaseId>,
    pub primary_key: Versioned<String>,
    pub replication_info: Versioned<ReplicationInfo>,
}

impl TableRecord {
    pub fn new(
        name: NameString,
        database: DatabaseId,
        primary_key: String,
        replication_info: ReplicationInfo,
        origin: Uuid,
    ) -> Self {
        Self {
            name: Versioned::new(name, origin),
            database: Versioned::new(database, origin),
            primary_key: Versioned::new(primary_key, origin),
            replication_info: Versioned::new(replication_info, origin),
        }
    }
}

impl Join for TableRecord {
    fn join(&mut self, other: &Self) {
        self.name.join(&other.name);
        self.database.join(&other.database);
        self.primary_key.join(&other.primary_key);
        self.replication_info.join(&other.replication_info);
    }
}
