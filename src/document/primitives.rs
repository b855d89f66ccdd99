use super::Document;
use crate::core::{ConfigError, NameString, Result};
use uuid::Uuid;

/// Short type name used in error messages.
pub fn document_type_name(document: &Document) -> &'static str {
    match document {
        Document::Null => "null",
        Document::Bool(_) => "bool",
        Document::Number(_) => "number",
        Document::String(_) => "string",
        Document::Array(_) => "array",
        Document::Object(_) => "object",
    }
}

pub fn name_to_document(name: &NameString) -> Document {
    Document::String(name.as_str().to_string())
}

/// `what` names the kind of name expected, e.g. `"table name"`.
pub fn name_from_document(document: &Document, what: &str) -> Result<NameString> {
    let raw = document
        .as_str()
        .ok_or_else(|| ConfigError::type_mismatch(format!("a {}", what), document.to_string()))?;
    NameString::new(raw).map_err(|_| {
        ConfigError::InvalidValue(format!(
            "{} `{}` is invalid (Use A-Za-z0-9_ only).",
            capitalize(what),
            raw
        ))
    })
}

pub fn uuid_to_document(uuid: &Uuid) -> Document {
    Document::String(uuid.to_string())
}

pub fn uuid_from_document(document: &Document) -> Result<Uuid> {
    let raw = document
        .as_str()
        .ok_or_else(|| ConfigError::type_mismatch("a UUID", document.to_string()))?;
    Uuid::parse_str(raw)
        .map_err(|_| ConfigError::InvalidValue(format!("Expected a UUID; got {}.", document)))
}

pub fn string_from_document(document: &Document) -> Result<String> {
    document
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::type_mismatch("a string", document.to_string()))
}

pub fn array_from_document(document: &Document) -> Result<&Vec<Document>> {
    document
        .as_array()
        .ok_or_else(|| ConfigError::type_mismatch("an array", document.to_string()))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
