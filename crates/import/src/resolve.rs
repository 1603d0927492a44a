use rowsync_store::{Filter, Record, Store, Value};

use crate::error::ImportError;
use crate::row::FieldValue;

/// Resolve `relation.attribute = value` to an existing related record.
///
/// Fails with `AssociationNotFound` when the relation is not declared on
/// `entity`, the attribute is unknown on the related entity, or no related
/// record matches. One attribute per lookup; compound keys across a
/// relation boundary are not supported. Re-queries the store every call
/// with no per-batch cache, so a record created by an earlier row is
/// visible.
pub fn resolve<S: Store + ?Sized>(
    store: &S,
    entity: &str,
    relation: &str,
    attribute: &str,
    value: &FieldValue,
) -> Result<Record, ImportError> {
    let not_found = || ImportError::AssociationNotFound {
        relation: relation.to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    };

    let assoc = store
        .schema()
        .association(entity, relation)
        .ok_or_else(not_found)?;

    let typed = match value {
        FieldValue::Reference(id) => {
            // Already resolved; re-fetch by identity.
            return store
                .query(&assoc.entity, &Filter::new().eq("id", Value::Int(id.0 as i64)))?
                .into_iter()
                .next()
                .ok_or_else(not_found);
        }
        FieldValue::Typed(v) => v.clone(),
        FieldValue::Raw(raw) => {
            if attribute == "id" {
                raw.trim().parse::<i64>().map(Value::Int).map_err(|_| not_found())?
            } else {
                let column = store
                    .schema()
                    .column(&assoc.entity, attribute)
                    .ok_or_else(not_found)?;
                // A value that cannot parse as the column type cannot
                // equal any stored value.
                Value::parse_typed(column.kind, raw).map_err(|_| not_found())?
            }
        }
    };

    let matches = store.query(&assoc.entity, &Filter::new().eq(attribute, typed))?;
    // First id-ordered match wins; ambiguity here is not an error
    // (unlike uid matching).
    matches.into_iter().next().ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rowsync_store::{MemoryStore, Schema};

    use super::*;

    const CATALOG: &str = r#"
[entities.categories.columns]
name = { type = "text", required = true }

[entities.items.columns]
name = { type = "text", required = true }

[entities.items.belongs_to]
category = { entity = "categories" }
"#;

    fn store_with_category(name: &str) -> MemoryStore {
        let mut store = MemoryStore::new(Schema::from_toml(CATALOG).unwrap());
        store
            .create(
                "categories",
                BTreeMap::from([("name".to_string(), Value::Text(name.into()))]),
            )
            .unwrap();
        store
    }

    #[test]
    fn resolves_by_attribute_equality() {
        let store = store_with_category("Ale");
        let record =
            resolve(&store, "items", "category", "name", &FieldValue::Raw("Ale".into())).unwrap();
        assert_eq!(record.get("name"), Some(&Value::Text("Ale".into())));
    }

    #[test]
    fn undeclared_relation_fails() {
        let store = store_with_category("Ale");
        let err = resolve(&store, "items", "supplier", "name", &FieldValue::Raw("Ale".into()))
            .unwrap_err();
        assert!(matches!(err, ImportError::AssociationNotFound { .. }));
    }

    #[test]
    fn unknown_attribute_fails() {
        let store = store_with_category("Ale");
        let err = resolve(&store, "items", "category", "slug", &FieldValue::Raw("ale".into()))
            .unwrap_err();
        assert!(matches!(err, ImportError::AssociationNotFound { .. }));
    }

    #[test]
    fn no_matching_record_fails() {
        let store = store_with_category("Ale");
        let err = resolve(&store, "items", "category", "name", &FieldValue::Raw("Stout".into()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no category found with name = 'Stout'"
        );
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let mut store = store_with_category("Ale");
        store
            .create(
                "categories",
                BTreeMap::from([("name".to_string(), Value::Text("Ale".into()))]),
            )
            .unwrap();
        let record =
            resolve(&store, "items", "category", "name", &FieldValue::Raw("Ale".into())).unwrap();
        assert_eq!(record.id.0, 1);
    }
}
