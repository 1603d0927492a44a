use rowsync_store::{Filter, Record, Store, Value};

use crate::error::ImportError;
use crate::options::ImportOptions;
use crate::row::{FieldValue, Row};
use crate::upsert::coerce_value;

/// Find the record the normalized row should update, if any.
///
/// Folds the configured uid fields left-to-right into a conjunctive filter.
/// A uid field naming a declared relation (value already resolved to a
/// reference) compares the foreign-key column against the referenced
/// identity; plain fields compare the typed value directly. Zero matches
/// signals "create"; more than one is rejected as ambiguous.
pub fn find_existing<S: Store + ?Sized>(
    store: &S,
    row: &Row,
    options: &ImportOptions,
) -> Result<Option<Record>, ImportError> {
    let missing: Vec<String> = options
        .uid
        .iter()
        .filter(|field| row.get(field).map_or(true, FieldValue::is_blank))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingUidValue { fields: missing });
    }

    let schema = store.schema();
    let mut filter = Filter::new();
    for field in &options.uid {
        let value = row.get(field).expect("checked above");
        filter = match (schema.association(&options.model, field), value) {
            (Some(assoc), FieldValue::Reference(id)) => {
                filter.eq(assoc.foreign_key.clone(), Value::Int(id.0 as i64))
            }
            _ => filter.eq(field.clone(), coerce_value(schema, &options.model, field, value)?),
        };
    }

    let mut matches = store.query(&options.model, &filter)?;
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        count => Err(ImportError::MultipleMatches { uid: options.uid.clone(), count }),
    }
}
