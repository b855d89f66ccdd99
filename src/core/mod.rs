pub mod error;
pub mod types;

pub use error::{ConfigError, Result};
pub use types::{DatabaseId, NameString, ServerId, TableId};
