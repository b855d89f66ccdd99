//! Identifier Codec
//!
//! Converts server and database identifiers between their internal UUID
//! form and the external document form. The external form depends on the
//! configured [`IdentifierFormat`]: either the human-readable name or the
//! UUID string. Name resolution is delegated to the directories.

mod directory;

pub use directory::{
    DatabaseDirectory, InMemoryDatabaseDirectory, InMemoryServerDirectory, ServerDirectory,
};

use crate::core::{ConfigError, DatabaseId, NameString, Result, ServerId};
use crate::document::{Document, document_type_name, uuid_from_document, uuid_to_document};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How identifiers are displayed in (and parsed from) documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierFormat {
    #[default]
    Name,
    Uuid,
}

impl FromStr for IdentifierFormat {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "name" => Ok(Self::Name),
            "uuid" => Ok(Self::Uuid),
            other => Err(ConfigError::InvalidValue(format!(
                "Identifier format must be `name` or `uuid`; got `{}`.",
                other
            ))),
        }
    }
}

impl fmt::Display for IdentifierFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Uuid => f.write_str("uuid"),
        }
    }
}

/// Encodes a server id. Returns `None` for servers that have been
/// permanently removed; the caller decides what to show instead.
pub async fn server_id_to_document(
    server_id: ServerId,
    format: IdentifierFormat,
    servers: &dyn ServerDirectory,
) -> Option<Document> {
    let name = servers.server_name(server_id).await?;
    Some(match format {
        IdentifierFormat::Name => Document::String(name.as_str().to_string()),
        IdentifierFormat::Uuid => uuid_to_document(server_id.as_uuid()),
    })
}

/// Decodes a server reference into the id of a live server.
pub async fn server_id_from_document(
    document: &Document,
    format: IdentifierFormat,
    servers: &dyn ServerDirectory,
) -> Result<ServerId> {
    match format {
        IdentifierFormat::Name => {
            let name = reference_name(document, "a server name")?;
            let mut matches = servers.servers_named(&name).await;
            match matches.len() {
                0 => Err(ConfigError::UnknownIdentifier(format!(
                    "Server `{}` does not exist.",
                    name
                ))),
                1 => Ok(matches.remove(0)),
                _ => Err(ConfigError::UnknownIdentifier(format!(
                    "Server `{}` is ambiguous; there are multiple servers with that name.",
                    name
                ))),
            }
        }
        IdentifierFormat::Uuid => {
            let server_id = ServerId::from(uuid_from_document(document)?);
            if servers.server_name(server_id).await.is_none() {
                return Err(ConfigError::UnknownIdentifier(format!(
                    "There is no server with UUID `{}`.",
                    server_id
                )));
            }
            Ok(server_id)
        }
    }
}

/// Encodes a database id. A database that no longer resolves by name is
/// shown by UUID so the document stays readable.
pub async fn database_id_to_document(
    database_id: DatabaseId,
    format: IdentifierFormat,
    databases: &dyn DatabaseDirectory,
) -> Document {
    match format {
        IdentifierFormat::Name => match databases.database_name(database_id).await {
            Some(name) => Document::String(name.as_str().to_string()),
            None => uuid_to_document(database_id.as_uuid()),
        },
        IdentifierFormat::Uuid => uuid_to_document(database_id.as_uuid()),
    }
}

/// Decodes a database reference into the id of a live database.
pub async fn database_id_from_document(
    document: &Document,
    format: IdentifierFormat,
    databases: &dyn DatabaseDirectory,
) -> Result<DatabaseId> {
    match format {
        IdentifierFormat::Name => {
            let name = reference_name(document, "a database name").map_err(|err| {
                ConfigError::UnknownDatabase(format!("In `db`: {}", err))
            })?;
            let mut matches = databases.databases_named(&name).await;
            match matches.len() {
                0 => Err(ConfigError::UnknownDatabase(format!(
                    "Database `{}` does not exist.",
                    name
                ))),
                1 => Ok(matches.remove(0)),
                _ => Err(ConfigError::UnknownDatabase(format!(
                    "Database `{}` is ambiguous; there are multiple databases with that name.",
                    name
                ))),
            }
        }
        IdentifierFormat::Uuid => {
            let uuid = uuid_from_document(document)
                .map_err(|err| ConfigError::UnknownDatabase(format!("In `db`: {}", err)))?;
            let database_id = DatabaseId::from(uuid);
            if databases.database_name(database_id).await.is_none() {
                return Err(ConfigError::UnknownDatabase(format!(
                    "There is no database with UUID `{}`.",
                    database_id
                )));
            }
            Ok(database_id)
        }
    }
}

/// Human-readable rendering of a database reference for error messages.
pub fn display_reference(document: &Document) -> String {
    match document.as_str() {
        Some(raw) => raw.to_string(),
        None => document.to_string(),
    }
}

fn reference_name(document: &Document, what: &str) -> Result<NameString> {
    let raw = document
        .as_str()
        .ok_or_else(|| ConfigError::type_mismatch(what, document_type_name(document)))?;
    NameString::new(raw)
        .map_err(|_| ConfigError::UnknownIdentifier(format!("`{}` is not a valid name.", raw)))
}
