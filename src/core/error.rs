use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unexpected key `{0}`.")]
    UnknownField(String),

    #[error("Expected {expected}; got {found}.")]
    TypeMismatch { expected: String, found: String },

    #[error("Expected a field named `{0}`.")]
    MissingField(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("You must specify at least one replica for each shard.")]
    EmptyReplicaSet,

    #[error("A server is listed more than once.")]
    DuplicateReplica,

    #[error("The director must be one of the replicas.")]
    DirectorNotAReplica,

    #[error("You must specify at least one shard.")]
    EmptyShardList,

    #[error("{0}")]
    InvalidShardCount(String),

    #[error("It's illegal to change a table's `{0}` field.")]
    ImmutableFieldViolation(String),

    #[error("{0}")]
    NameAlreadyExists(String),

    #[error(
        "If you want to create a new table by inserting into `table_config`, you must use an auto-generated primary key."
    )]
    ExplicitIdNotAllowed,

    #[error("{0}")]
    UnknownIdentifier(String),

    #[error("{0}")]
    UnknownDatabase(String),

    #[error("{0}")]
    GenerationFailed(String),

    #[error("{0}")]
    SplitPointsFailed(String),

    #[error("The operation was interrupted.")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{prefix}{source}")]
    Context {
        prefix: String,
        source: Box<ConfigError>,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Wraps the error with a free-form prefix, e.g. `"When generating ...: "`.
    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        // Interruption is reported as-is so callers can retry without parsing text.
        if self.is_interruption() {
            return self;
        }
        ConfigError::Context {
            prefix: prefix.into(),
            source: Box::new(self),
        }
    }

    /// Prefixes the error with the path of the enclosing document field.
    pub fn in_field(self, field: &str) -> Self {
        self.with_prefix(format!("In `{}`: ", field))
    }

    /// Strips every `Context` layer and returns the underlying error.
    pub fn root_cause(&self) -> &ConfigError {
        let mut current = self;
        while let ConfigError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn is_interruption(&self) -> bool {
        matches!(self.root_cause(), ConfigError::Interrupted)
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        ConfigError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}
