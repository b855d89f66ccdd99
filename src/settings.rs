use crate::core::{ConfigError, Result};
use crate::identifier::IdentifierFormat;
use crate::planner::DEFAULT_MAX_SHARDS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Backend configuration
///
/// Every field has a default, so an empty JSON object is a valid settings
/// file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSettings {
    /// Origin stamped into every version this node writes
    #[serde(default = "Uuid::new_v4")]
    pub node_id: Uuid,

    /// How server and database references appear in documents
    #[serde(default)]
    pub identifier_format: IdentifierFormat,

    /// Replicas per shard for new tables that omit `shards`
    #[serde(default = "default_replicas")]
    pub default_replicas: usize,

    /// Largest shard count the planner accepts
    #[serde(default = "default_max_shards")]
    pub max_shards: usize,
}

fn default_replicas() -> usize {
    1
}

fn default_max_shards() -> usize {
    DEFAULT_MAX_SHARDS
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            node_id: Uuid::new_v4(),
            identifier_format: IdentifierFormat::default(),
            default_replicas: default_replicas(),
            max_shards: default_max_shards(),
        }
    }
}

impl BackendSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_id(mut self, node_id: Uuid) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn identifier_format(mut self, format: IdentifierFormat) -> Self {
        self.identifier_format = format;
        self
    }

    pub fn default_replicas(mut self, replicas: usize) -> Self {
        self.default_replicas = replicas;
        self
    }

    pub fn max_shards(mut self, max_shards: usize) -> Self {
        self.max_shards = max_shards;
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw)
            .map_err(|err| ConfigError::InvalidValue(format!("Invalid settings: {}", err)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.default_replicas == 0 {
            return Err(ConfigError::InvalidValue(
                "Invalid settings: `default_replicas` must be at least 1.".to_string(),
            ));
        }
        if self.max_shards == 0 {
            return Err(ConfigError::InvalidValue(
                "Invalid settings: `max_shards` must be at least 1.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = BackendSettings::from_json_str("{}").unwrap();
        assert_eq!(settings.identifier_format, IdentifierFormat::Name);
        assert_eq!(settings.default_replicas, 1);
        assert_eq!(settings.max_shards, DEFAULT_MAX_SHARDS);
        assert!(!settings.node_id.is_nil());
    }

    #[test]
    fn test_builder() {
        let node = Uuid::new_v4();
        let settings = BackendSettings::new()
            .node_id(node)
            .identifier_format(IdentifierFormat::Uuid)
            .default_replicas(3)
            .max_shards(8);
        assert_eq!(settings.node_id, node);
        assert_eq!(settings.identifier_format, IdentifierFormat::Uuid);
        assert_eq!(settings.default_replicas, 3);
        assert_eq!(settings.max_shards, 8);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(BackendSettings::from_json_str(r#"{"max_shards": 0}"#).is_err());
        assert!(BackendSettings::from_json_str(r#"{"default_replicas": 0}"#).is_err());
        assert!(BackendSettings::from_json_str(r#"{"identifier_format": "id"}"#).is_err());
        assert!(BackendSettings::from_json_str(r#"{"shards": 2}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let node = Uuid::new_v4();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"node_id": "{}", "identifier_format": "uuid", "max_shards": 4}}"#,
            node
        )
        .unwrap();

        let settings = BackendSettings::load(file.path()).unwrap();
        assert_eq!(settings.node_id, node);
        assert_eq!(settings.identifier_format, IdentifierFormat::Uuid);
        assert_eq!(settings.max_shards, 4);
        assert_eq!(settings.default_replicas, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BackendSettings::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
