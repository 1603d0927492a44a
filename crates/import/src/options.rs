use std::collections::BTreeMap;

use rowsync_store::{Filter, Schema};

use crate::error::ImportError;
use crate::row::FieldValue;

/// Per-batch import configuration. Constructed once, read-only thereafter;
/// there is no process-wide default state.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Target entity type.
    pub model: String,
    /// Ordered uid fields used to find an existing record. Default: `id`.
    pub uid: Vec<String>,
    /// Keep exactly these fields (checked before `except`).
    pub only: Vec<String>,
    /// Drop exactly these fields.
    pub except: Vec<String>,
    /// Fill gaps in each row; a value present in the row always wins.
    pub default_values: BTreeMap<String, FieldValue>,
    /// Bounds the deletion sweep. Never bounds uid matching.
    pub existing_record_scope: Option<Filter>,
    /// Delete in-scope records absent from this batch's successful imports.
    pub delete_missing_records: bool,
}

impl ImportOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            uid: vec!["id".to_string()],
            only: Vec::new(),
            except: Vec::new(),
            default_values: BTreeMap::new(),
            existing_record_scope: None,
            delete_missing_records: false,
        }
    }

    pub fn uid<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uid = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn except<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_value(
        mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.default_values.insert(field.into(), value.into());
        self
    }

    pub fn scope(mut self, filter: Filter) -> Self {
        self.existing_record_scope = Some(filter);
        self
    }

    pub fn delete_missing(mut self, yes: bool) -> Self {
        self.delete_missing_records = yes;
        self
    }

    /// Batch-fatal checks, run before any row is processed.
    pub fn validate(&self, schema: &Schema) -> Result<(), ImportError> {
        if !schema.has_entity(&self.model) {
            return Err(ImportError::Config(format!(
                "model '{}' is not a declared entity",
                self.model
            )));
        }
        if self.uid.is_empty() {
            return Err(ImportError::Config("uid field list must not be empty".into()));
        }
        if self.uid.iter().any(|f| f.trim().is_empty()) {
            return Err(ImportError::Config("uid field names must not be blank".into()));
        }
        if !self.only.is_empty() && !self.except.is_empty() {
            return Err(ImportError::Config(
                "'only' and 'except' are mutually exclusive".into(),
            ));
        }
        Ok(())
    }
}
