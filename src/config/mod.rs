//! Conversion between table configuration documents and the internal
//! replication model.
//!
//! - `shard.rs` - one shard's replicas and director
//! - `table.rs` - the whole table row (`name`, `db`, `id`, `primary_key`, `shards`)

mod shard;
mod table;

pub use shard::{shard_from_document, shard_to_document};
pub use table::{DecodedTableConfig, TableConfigDecoder, table_config_to_document};
