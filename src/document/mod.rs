//! Document Module
//!
//! External representation of administrative rows. Documents are plain
//! JSON values; this module provides the strict readers used to turn
//! untrusted documents into typed values.
//!
//! # Architecture
//!
//! - `object.rs` - Strict object reader (required keys, no extra keys)
//! - `primitives.rs` - Names, UUIDs, strings and arrays

mod object;
mod primitives;

pub use object::ObjectReader;
pub use primitives::{
    array_from_document, document_type_name, name_from_document, name_to_document,
    string_from_document, uuid_from_document, uuid_to_document,
};

/// An external, untrusted configuration document.
pub type Document = serde_json::Value;
