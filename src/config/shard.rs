use crate::core::{ConfigError, Result};
use crate::document::{Document, ObjectReader, array_from_document};
use crate::identifier::{
    IdentifierFormat, ServerDirectory, server_id_from_document, server_id_to_document,
};
use crate::interrupt::{Interruptor, interruptible};
use crate::metadata::ShardConfig;
use futures::future::join_all;
use serde_json::json;
use std::collections::BTreeSet;

/// Encodes a shard. Permanently removed replicas are left out, and a
/// removed (or unknown) director is shown as `null`.
pub async fn shard_to_document(
    shard: &ShardConfig,
    format: IdentifierFormat,
    servers: &dyn ServerDirectory,
) -> Document {
    let replicas = join_all(
        shard
            .replicas
            .iter()
            .map(|replica| server_id_to_document(*replica, format, servers)),
    )
    .await
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    let director = match shard.director {
        Some(director) => server_id_to_document(director, format, servers)
            .await
            .unwrap_or(Document::Null),
        None => Document::Null,
    };

    json!({
        "replicas": replicas,
        "director": director,
    })
}

/// Decodes and validates a shard document.
///
/// `director: null` is accepted and means "no known director": that is how a
/// dead director is displayed, and the document must still be writable back.
pub async fn shard_from_document(
    document: &Document,
    format: IdentifierFormat,
    servers: &dyn ServerDirectory,
    interruptor: &Interruptor,
) -> Result<ShardConfig> {
    let mut reader = ObjectReader::new(document)?;

    let replicas_document = reader.get("replicas")?;
    let items = array_from_document(replicas_document).map_err(|err| err.in_field("replicas"))?;
    let mut replicas = BTreeSet::new();
    for item in items {
        let server_id = interruptible(server_id_from_document(item, format, servers), interruptor)
            .await?
            .map_err(|err| err.in_field("replicas"))?;
        if !replicas.insert(server_id) {
            return Err(ConfigError::DuplicateReplica.in_field("replicas"));
        }
    }
    if replicas.is_empty() {
        return Err(ConfigError::EmptyReplicaSet);
    }

    let director_document = reader.get("director")?;
    let director = if director_document.is_null() {
        None
    } else {
        let server_id = interruptible(
            server_id_from_document(director_document, format, servers),
            interruptor,
        )
        .await?
        .map_err(|err| err.in_field("director"))?;
        if !replicas.contains(&server_id) {
            return Err(ConfigError::DirectorNotAReplica);
        }
        Some(server_id)
    };

    reader.check_no_extra_keys()?;

    Ok(ShardConfig { replicas, director })
}
