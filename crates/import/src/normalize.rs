use rowsync_store::Store;

use crate::error::ImportError;
use crate::options::ImportOptions;
use crate::resolve::resolve;
use crate::row::{FieldValue, Row};

/// Normalize one row, in fixed order: merge defaults (gaps only), resolve
/// dotted key paths to record references, then apply column filters.
/// A failed key-path resolution is fatal for the row; nothing is
/// partially imported.
pub fn normalize<S: Store + ?Sized>(
    store: &S,
    mut row: Row,
    options: &ImportOptions,
) -> Result<Row, ImportError> {
    // 1. Defaults fill gaps; a value present in the row always wins.
    for (field, value) in &options.default_values {
        row.set_if_absent(field, value.clone());
    }

    // 2. Resolve `relation.attribute` keys. The dotted key is removed and
    //    the bare relation name maps to the resolved reference, collapsing
    //    any plain entry under the same relation name.
    let dotted: Vec<String> = row
        .keys()
        .filter(|key| key.contains('.'))
        .cloned()
        .collect();
    for key in dotted {
        let value = row.remove(&key).expect("key listed above");
        let (relation, attribute) = key.split_once('.').expect("key contains '.'");
        let related = resolve(store, &options.model, relation, attribute, &value)?;
        row.set(relation, FieldValue::Reference(related.id));
    }

    // 3. Column filtering: `only` wins when both could apply.
    if !options.only.is_empty() {
        row.retain(|key| options.only.iter().any(|f| f == key));
    } else if !options.except.is_empty() {
        for field in &options.except {
            row.remove(field);
        }
    }

    Ok(row)
}
