use super::Document;
use super::primitives::document_type_name;
use crate::core::{ConfigError, Result};
use serde_json::Map;
use std::collections::BTreeSet;

/// Reads fields out of a document object and remembers which keys were used,
/// so that leftover keys can be rejected once decoding is done.
pub struct ObjectReader<'a> {
    object: &'a Map<String, Document>,
    consumed: BTreeSet<&'a str>,
}

impl<'a> ObjectReader<'a> {
    pub fn new(document: &'a Document) -> Result<Self> {
        let object = document
            .as_object()
            .ok_or_else(|| ConfigError::type_mismatch("an object", document_type_name(document)))?;
        Ok(Self {
            object,
            consumed: BTreeSet::new(),
        })
    }

    /// Whether `key` is present. Does not mark the key as consumed.
    pub fn has(&self, key: &str) -> bool {
        self.object.contains_key(key)
    }

    /// Returns the value of a required key and marks it as consumed.
    pub fn get(&mut self, key: &str) -> Result<&'a Document> {
        let object: &'a Map<String, Document> = self.object;
        let (name, value) = object
            .get_key_value(key)
            .ok_or_else(|| ConfigError::MissingField(key.to_string()))?;
        self.consumed.insert(name.as_str());
        Ok(value)
    }

    /// Rejects the first (in key order) key that was never consumed.
    pub fn check_no_extra_keys(&self) -> Result<()> {
        let mut extra = self
            .object
            .keys()
            .filter(|key| !self.consumed.contains(key.as_str()))
            .collect::<Vec<_>>();
        extra.sort();
        match extra.first() {
            Some(key) => Err(ConfigError::UnknownField((*key).clone())),
            None => Ok(()),
        }
    }
}
