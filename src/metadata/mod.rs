//! Versioned table metadata.
//!
//! Records are held in copy-on-write snapshots. Each mutable field carries a
//! [`VersionStamp`] so that snapshots modified independently on different
//! nodes can be joined back together without coordination.

mod snapshot;
mod store;
mod table;
mod versioned;

pub use snapshot::TablesSnapshot;
pub use store::{InMemoryMetadataStore, MetadataStore};
pub use table::{
    DEFAULT_PRIMARY_KEY, ReplicationInfo, ShardConfig, ShardScheme, SplitPoint, TableConfig,
    TableRecord,
};
pub use versioned::{Deletable, Join, VersionStamp, Versioned};
