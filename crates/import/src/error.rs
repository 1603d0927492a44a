use std::fmt;

use rowsync_store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// A configured uid field is absent or blank in the normalized row.
    MissingUidValue { fields: Vec<String> },
    /// The composite uid filter matched more than one existing record.
    MultipleMatches { uid: Vec<String>, count: usize },
    /// Relation not declared, attribute unknown on the related entity, or
    /// no related record satisfies the equality lookup.
    AssociationNotFound { relation: String, attribute: String, value: String },
    /// Store rejected a create or update.
    Validation { entity: String, message: String },
    /// Malformed options; fatal for the whole batch.
    Config(String),
    /// CSV parse error in the row source.
    Csv(String),
    /// File read/write error.
    Io(String),
}

impl ImportError {
    /// Per-row errors become `Failed` outcomes; anything else aborts the
    /// batch before (or without) processing rows.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUidValue { .. }
                | Self::MultipleMatches { .. }
                | Self::AssociationNotFound { .. }
                | Self::Validation { .. }
        )
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUidValue { fields } => {
                write!(f, "missing uid value(s): {}", fields.join(", "))
            }
            Self::MultipleMatches { uid, count } => {
                write!(f, "uid [{}] matched {count} records", uid.join(", "))
            }
            Self::AssociationNotFound { relation, attribute, value } => {
                write!(f, "no {relation} found with {attribute} = '{value}'")
            }
            Self::Validation { entity, message } => {
                write!(f, "entity '{entity}': {message}")
            }
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownEntity(entity) => Self::Config(format!("unknown entity: {entity}")),
            StoreError::UnknownAttribute { entity, attribute } => Self::Validation {
                entity,
                message: format!("unknown attribute '{attribute}'"),
            },
            StoreError::Validation { entity, message } => Self::Validation { entity, message },
            StoreError::Schema(msg) => Self::Config(msg),
            StoreError::Io(msg) => Self::Io(msg),
        }
    }
}
