use std::collections::BTreeMap;

use rowsync_store::{Record, Schema, Store, Value};

use crate::error::ImportError;
use crate::matcher::find_existing;
use crate::options::ImportOptions;
use crate::row::{FieldValue, Row};

/// Create or update exactly one record for a normalized row.
///
/// Match branch: uid fields are stripped from the row before the update
/// (a uid field can never be altered by its own role as a match key) and
/// the remaining fields apply as a merge. Create branch: uid values and
/// remaining fields seed the new record in one attribute set. Returns the
/// persisted record and whether it was created.
pub fn upsert<S: Store + ?Sized>(
    store: &mut S,
    row: &Row,
    options: &ImportOptions,
) -> Result<(Record, bool), ImportError> {
    match find_existing(&*store, row, options)? {
        Some(existing) => {
            let mut remaining = row.clone();
            for field in &options.uid {
                remaining.remove(field);
            }
            let attrs = to_attrs(store.schema(), &options.model, &remaining)?;
            let updated = store.update(&options.model, existing.id, attrs)?;
            Ok((updated, false))
        }
        None => {
            let attrs = to_attrs(store.schema(), &options.model, row)?;
            let created = store.create(&options.model, attrs)?;
            Ok((created, true))
        }
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Turn one row field into a typed store value. Raw strings coerce per the
/// schema column type; the pseudo-field `id` coerces to int; raw values
/// under unknown columns pass through as text so the store's own
/// unknown-attribute rejection carries the diagnostics.
pub(crate) fn coerce_value(
    schema: &Schema,
    entity: &str,
    field: &str,
    value: &FieldValue,
) -> Result<Value, ImportError> {
    match value {
        FieldValue::Reference(id) => Ok(Value::Int(id.0 as i64)),
        FieldValue::Typed(v) => Ok(v.clone()),
        FieldValue::Raw(raw) => {
            if field == "id" {
                if raw.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return raw.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    ImportError::Validation {
                        entity: entity.to_string(),
                        message: format!("cannot parse id '{raw}'"),
                    }
                });
            }
            match schema.column(entity, field) {
                Some(column) => Value::parse_typed(column.kind, raw).map_err(|message| {
                    ImportError::Validation { entity: entity.to_string(), message }
                }),
                None => Ok(Value::Text(raw.clone())),
            }
        }
    }
}

/// Full attribute set for a create/update. Resolved references translate
/// to their foreign-key column; everything else coerces per column type.
fn to_attrs(
    schema: &Schema,
    entity: &str,
    row: &Row,
) -> Result<BTreeMap<String, Value>, ImportError> {
    let mut attrs = BTreeMap::new();
    for (field, value) in row.iter() {
        match (schema.association(entity, field), value) {
            (Some(assoc), FieldValue::Reference(id)) => {
                attrs.insert(assoc.foreign_key.clone(), Value::Int(id.0 as i64));
            }
            _ => {
                attrs.insert(field.clone(), coerce_value(schema, entity, field, value)?);
            }
        }
    }
    Ok(attrs)
}

/// Best-effort diagnostic attributes for a failed row: only fields the
/// schema recognizes, only values that coerce cleanly. Never persisted.
pub(crate) fn recognized_attrs(
    schema: &Schema,
    entity: &str,
    row: &Row,
) -> BTreeMap<String, Value> {
    let mut attrs = BTreeMap::new();
    for (field, value) in row.iter() {
        if field.contains('.') {
            continue;
        }
        if let (Some(assoc), FieldValue::Reference(id)) =
            (schema.association(entity, field), value)
        {
            attrs.insert(assoc.foreign_key.clone(), Value::Int(id.0 as i64));
            continue;
        }
        if schema.column(entity, field).is_none() {
            continue;
        }
        if let Ok(typed) = coerce_value(schema, entity, field, value) {
            attrs.insert(field.clone(), typed);
        }
    }
    attrs
}
