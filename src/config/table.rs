use super::shard::{shard_from_document, shard_to_document};
use crate::core::{ConfigError, NameString, Result, TableId};
use crate::document::{
    Document, ObjectReader, array_from_document, name_from_document, string_from_document,
    uuid_from_document,
};
use crate::identifier::{IdentifierFormat, ServerDirectory};
use crate::interrupt::Interruptor;
use crate::metadata::{DEFAULT_PRIMARY_KEY, ShardScheme, TableConfig, TablesSnapshot};
use crate::planner::{ConfigGenerator, GenerateConfigParams};
use futures::future::join_all;
use serde_json::json;

/// Encodes only the `shards` part of a table row. The row formatter adds
/// `name`, `db`, `id` and `primary_key` on top; reconfigure results use
/// this partial form directly.
pub async fn table_config_to_document(
    config: &TableConfig,
    format: IdentifierFormat,
    servers: &dyn ServerDirectory,
) -> Document {
    let shards = join_all(
        config
            .shards
            .iter()
            .map(|shard| shard_to_document(shard, format, servers)),
    )
    .await;
    json!({ "shards": shards })
}

/// Everything a table row document carries, decoded and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTableConfig {
    pub name: NameString,
    /// Kept undecoded: an update only compares it against the stored
    /// database, a create resolves it through the database directory.
    pub db: Document,
    pub id: TableId,
    pub primary_key: String,
    pub config: TableConfig,
}

/// Decodes full table rows.
pub struct TableConfigDecoder<'a> {
    pub format: IdentifierFormat,
    pub servers: &'a dyn ServerDirectory,
    pub generator: &'a dyn ConfigGenerator,
    /// Replicas per shard when `shards` is omitted for a new table.
    pub default_replicas: usize,
}

impl TableConfigDecoder<'_> {
    /// `primary_key` and `shards` may only be omitted when the table did not
    /// exist before. A present but malformed field is an error either way.
    pub async fn decode(
        &self,
        document: &Document,
        existed_before: bool,
        all_tables: &TablesSnapshot,
        interruptor: &Interruptor,
    ) -> Result<DecodedTableConfig> {
        let mut reader = ObjectReader::new(document)?;

        let name = name_from_document(reader.get("name")?, "table name")
            .map_err(|err| err.in_field("name"))?;

        let db = reader.get("db")?.clone();

        let id = uuid_from_document(reader.get("id")?)
            .map(TableId::from)
            .map_err(|err| err.in_field("id"))?;

        let primary_key = if existed_before || reader.has("primary_key") {
            string_from_document(reader.get("primary_key")?)
                .map_err(|err| err.in_field("primary_key"))?
        } else {
            DEFAULT_PRIMARY_KEY.to_string()
        };

        let config = if existed_before || reader.has("shards") {
            self.decode_shards(reader.get("shards")?, interruptor)
                .await
                .map_err(|err| err.in_field("shards"))?
        } else {
            self.generate_for_new_table(all_tables, interruptor)
                .await
                .map_err(|err| err.with_prefix("When generating configuration for new table: "))?
        };

        reader.check_no_extra_keys()?;

        Ok(DecodedTableConfig {
            name,
            db,
            id,
            primary_key,
            config,
        })
    }

    async fn decode_shards(
        &self,
        document: &Document,
        interruptor: &Interruptor,
    ) -> Result<TableConfig> {
        let items = array_from_document(document)?;
        let mut shards = Vec::with_capacity(items.len());
        for item in items {
            shards.push(shard_from_document(item, self.format, self.servers, interruptor).await?);
        }
        if shards.is_empty() {
            return Err(ConfigError::EmptyShardList);
        }
        Ok(TableConfig { shards })
    }

    async fn generate_for_new_table(
        &self,
        all_tables: &TablesSnapshot,
        interruptor: &Interruptor,
    ) -> Result<TableConfig> {
        let usage = all_tables.server_usage(None);
        let params = GenerateConfigParams::new(1, self.default_replicas);
        self.generator
            .generate(&usage, &params, &ShardScheme::one_shard(), interruptor)
            .await
    }
}
