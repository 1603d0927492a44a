use std::collections::BTreeSet;
use std::path::Path;

use rowsync_store::{Filter, RecordId, Store};

use crate::error::ImportError;
use crate::model::{BatchResult, ImportOutcome, RowResult};
use crate::normalize::normalize;
use crate::options::ImportOptions;
use crate::row::Row;
use crate::source::{rows_from_csv_file, rows_from_csv_text};
use crate::upsert::{recognized_attrs, upsert};

/// Run one batch: rows in input order, one outcome per row, then the
/// optional deletion sweep. Per-row errors become `Failed` outcomes and the
/// batch continues; configuration and store-level (IO) errors are fatal for
/// the whole batch.
pub fn run<S: Store + ?Sized>(
    store: &mut S,
    rows: Vec<Row>,
    options: &ImportOptions,
) -> Result<BatchResult, ImportError> {
    options.validate(store.schema())?;

    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        // Each row fully commits before the next starts, so a later row
        // can match or reference what an earlier row created.
        let result = import_row(store, &row, options)?;
        outcomes.push(ImportOutcome { row, result });
    }

    let deleted = if options.delete_missing_records {
        sweep(store, &outcomes, options)?
    } else {
        Vec::new()
    };

    Ok(BatchResult { outcomes, deleted })
}

fn import_row<S: Store + ?Sized>(
    store: &mut S,
    row: &Row,
    options: &ImportOptions,
) -> Result<RowResult, ImportError> {
    let attempt = normalize(&*store, row.clone(), options)
        .and_then(|normalized| upsert(store, &normalized, options));
    match attempt {
        Ok((record, true)) => Ok(RowResult::Created(record)),
        Ok((record, false)) => Ok(RowResult::Updated(record)),
        Err(error) if error.is_row_error() => Ok(RowResult::Failed {
            error,
            partial: recognized_attrs(store.schema(), &options.model, row),
        }),
        // Config/IO/CSV failures are batch-fatal, not per-row.
        Err(error) => Err(error),
    }
}

/// Full diff-then-delete pass, computed only after every row has been
/// processed. Only successful outcomes count as "present": a record
/// partially touched by a failed row gets no protection. Scope bounds what
/// is eligible for deletion; out-of-scope records are untouched.
fn sweep<S: Store + ?Sized>(
    store: &mut S,
    outcomes: &[ImportOutcome],
    options: &ImportOptions,
) -> Result<Vec<RecordId>, ImportError> {
    let scope = options.existing_record_scope.clone().unwrap_or_else(Filter::new);
    let existing = store.query(&options.model, &scope)?;

    let imported: BTreeSet<RecordId> = outcomes
        .iter()
        .filter_map(|o| o.result.record())
        .map(|record| record.id)
        .collect();

    let doomed: Vec<RecordId> = existing
        .iter()
        .map(|record| record.id)
        .filter(|id| !imported.contains(id))
        .collect();

    store.delete(&options.model, &doomed)?;
    Ok(doomed)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Convenience wrapper binding a store and options, mirroring the
/// file/text/rows entry points callers actually use.
pub struct Session<'a, S: Store + ?Sized> {
    store: &'a mut S,
    options: ImportOptions,
}

impl<'a, S: Store + ?Sized> Session<'a, S> {
    pub fn new(store: &'a mut S, options: ImportOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn import_rows(&mut self, rows: Vec<Row>) -> Result<BatchResult, ImportError> {
        run(self.store, rows, &self.options)
    }

    pub fn import_csv_text(&mut self, text: &str) -> Result<BatchResult, ImportError> {
        let rows = rows_from_csv_text(text)?;
        run(self.store, rows, &self.options)
    }

    pub fn import_csv_file(&mut self, path: &Path) -> Result<BatchResult, ImportError> {
        let rows = rows_from_csv_file(path)?;
        run(self.store, rows, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rowsync_store::{MemoryStore, Record, Schema, StoreError, Value};

    use super::*;

    const CATALOG: &str = r#"
[entities.items.columns]
name  = { type = "text", required = true }
price = { type = "float" }
"#;

    fn store() -> MemoryStore {
        MemoryStore::new(Schema::from_toml(CATALOG).unwrap())
    }

    #[test]
    fn config_error_aborts_before_any_row() {
        let mut store = store();
        let options = ImportOptions::new("items").only(["name"]).except(["price"]);
        let rows = vec![Row::from_pairs([("name", "Beer")])];

        let err = run(&mut store, rows, &options).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
        assert_eq!(store.count("items"), 0);
    }

    #[test]
    fn failing_row_never_aborts_the_batch() {
        let mut store = store();
        let options = ImportOptions::new("items").uid(["name"]);
        let rows = vec![
            Row::from_pairs([("price", "2.5")]), // no uid value
            Row::from_pairs([("name", "Beer"), ("price", "3.0")]),
        ];

        let batch = run(&mut store, rows, &options).unwrap();
        assert_eq!(batch.summary().failed, 1);
        assert_eq!(batch.summary().created, 1);
        assert_eq!(store.count("items"), 1);
    }

    #[test]
    fn later_row_matches_earlier_create() {
        let mut store = store();
        let options = ImportOptions::new("items").uid(["name"]);
        let rows = vec![
            Row::from_pairs([("name", "Beer"), ("price", "2.5")]),
            Row::from_pairs([("name", "Beer"), ("price", "3.0")]),
        ];

        let batch = run(&mut store, rows, &options).unwrap();
        assert_eq!(batch.summary().created, 1);
        assert_eq!(batch.summary().updated, 1);
        assert_eq!(store.count("items"), 1);
        let record = batch.records()[1];
        assert_eq!(record.get("price"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn session_imports_csv_text() {
        let mut store = store();
        let mut session =
            Session::new(&mut store, ImportOptions::new("items").uid(["name"]));
        let batch = session
            .import_csv_text("name,price\nBeer,2.5\nWine,12.0\n")
            .unwrap();
        assert_eq!(batch.summary().created, 2);
    }

    #[test]
    fn session_imports_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "name,price\nBeer,2.5\n").unwrap();

        let mut store = store();
        let mut session =
            Session::new(&mut store, ImportOptions::new("items").uid(["name"]));
        assert_eq!(session.options().model, "items");

        let batch = session.import_csv_file(&path).unwrap();
        assert_eq!(batch.summary().created, 1);
        assert_eq!(session.options().uid, vec!["name".to_string()]);
    }

    /// Query failures that are not about the row (lost backing storage,
    /// broken schema) abort the batch instead of masquerading as a `Failed`
    /// outcome.
    struct BrokenStore {
        inner: MemoryStore,
    }

    impl Store for BrokenStore {
        fn schema(&self) -> &Schema {
            self.inner.schema()
        }

        fn query(&self, _entity: &str, _filter: &Filter) -> Result<Vec<Record>, StoreError> {
            Err(StoreError::Io("backing file unreadable".into()))
        }

        fn create(
            &mut self,
            entity: &str,
            attrs: BTreeMap<String, Value>,
        ) -> Result<Record, StoreError> {
            self.inner.create(entity, attrs)
        }

        fn update(
            &mut self,
            entity: &str,
            id: RecordId,
            attrs: BTreeMap<String, Value>,
        ) -> Result<Record, StoreError> {
            self.inner.update(entity, id, attrs)
        }

        fn delete(&mut self, entity: &str, ids: &[RecordId]) -> Result<usize, StoreError> {
            self.inner.delete(entity, ids)
        }
    }

    #[test]
    fn store_failure_aborts_the_batch() {
        let mut store = BrokenStore { inner: store() };
        let options = ImportOptions::new("items").uid(["name"]);
        let rows = vec![
            Row::from_pairs([("name", "Beer")]),
            Row::from_pairs([("name", "Wine")]),
        ];

        let err = run(&mut store, rows, &options).unwrap_err();
        assert!(!err.is_row_error());
        assert!(matches!(err, ImportError::Io(_)));
        assert_eq!(store.inner.count("items"), 0);
    }
}
