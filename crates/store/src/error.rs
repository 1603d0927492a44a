use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Schema TOML parse or validation error.
    Schema(String),
    /// Entity type not declared in the schema.
    UnknownEntity(String),
    /// Attribute not declared on the entity.
    UnknownAttribute { entity: String, attribute: String },
    /// Create/update rejected (type mismatch, blank required column, taken id).
    Validation { entity: String, message: String },
    /// Snapshot file read/write error.
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(msg) => write!(f, "schema error: {msg}"),
            Self::UnknownEntity(entity) => write!(f, "unknown entity: {entity}"),
            Self::UnknownAttribute { entity, attribute } => {
                write!(f, "entity '{entity}': unknown attribute '{attribute}'")
            }
            Self::Validation { entity, message } => {
                write!(f, "entity '{entity}': validation failed: {message}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
