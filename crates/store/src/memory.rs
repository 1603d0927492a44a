use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::{Filter, Record, RecordId};
use crate::schema::Schema;
use crate::store::Store;
use crate::value::Value;

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory reference store with a JSON snapshot format. Single-writer,
/// read-your-writes; every mutation is visible to the next query.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Schema,
    tables: BTreeMap<String, BTreeMap<RecordId, Record>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        let tables = schema
            .entities
            .keys()
            .map(|name| (name.clone(), BTreeMap::new()))
            .collect();
        Self { schema, tables, next_id: 1 }
    }

    pub fn count(&self, entity: &str) -> usize {
        self.tables.get(entity).map_or(0, BTreeMap::len)
    }

    fn table(&self, entity: &str) -> Result<&BTreeMap<RecordId, Record>, StoreError> {
        self.tables
            .get(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
    }

    /// Attribute-level checks shared by create and update. `id` is handled
    /// by the caller and is never a schema column.
    fn check_attrs(
        &self,
        entity: &str,
        attrs: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        for (field, value) in attrs {
            let column = self.schema.column(entity, field).ok_or_else(|| {
                StoreError::UnknownAttribute {
                    entity: entity.to_string(),
                    attribute: field.clone(),
                }
            })?;
            if !value.fits(column.kind) {
                return Err(StoreError::Validation {
                    entity: entity.to_string(),
                    message: format!("attribute '{field}' has wrong type for {value:?}"),
                });
            }
        }
        Ok(())
    }

    /// Every required column must be present and non-blank in the final
    /// attribute set.
    fn check_required(
        &self,
        entity: &str,
        attrs: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let def = self
            .schema
            .entity(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        for (field, column) in &def.columns {
            if column.required && attrs.get(field).unwrap_or(&Value::Null).is_blank() {
                return Err(StoreError::Validation {
                    entity: entity.to_string(),
                    message: format!("required attribute '{field}' is blank"),
                });
            }
        }
        Ok(())
    }

    /// Normalize int values destined for float columns so equality filters
    /// behave after a round trip.
    fn widen(&self, entity: &str, attrs: &mut BTreeMap<String, Value>) {
        for (field, value) in attrs.iter_mut() {
            if let Value::Int(i) = value {
                if let Some(column) = self.schema.column(entity, field) {
                    if column.kind == crate::schema::ColumnType::Float {
                        *value = Value::Float(*i as f64);
                    }
                }
            }
        }
    }
}

impl Store for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn query(&self, entity: &str, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .table(entity)?
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn create(
        &mut self,
        entity: &str,
        mut attrs: BTreeMap<String, Value>,
    ) -> Result<Record, StoreError> {
        self.table(entity)?;

        let id = match attrs.remove("id") {
            None | Some(Value::Null) => {
                let id = RecordId(self.next_id);
                self.next_id += 1;
                id
            }
            Some(Value::Int(i)) if i > 0 => {
                let id = RecordId(i as u64);
                if self.tables[entity].contains_key(&id) {
                    return Err(StoreError::Validation {
                        entity: entity.to_string(),
                        message: format!("id {id} already taken"),
                    });
                }
                self.next_id = self.next_id.max(id.0 + 1);
                id
            }
            Some(other) => {
                return Err(StoreError::Validation {
                    entity: entity.to_string(),
                    message: format!("id must be a positive int, got {other:?}"),
                });
            }
        };

        self.check_attrs(entity, &attrs)?;
        self.widen(entity, &mut attrs);
        self.check_required(entity, &attrs)?;

        let record = Record { id, entity: entity.to_string(), attrs };
        self.tables
            .get_mut(entity)
            .expect("checked above")
            .insert(id, record.clone());
        Ok(record)
    }

    fn update(
        &mut self,
        entity: &str,
        id: RecordId,
        mut attrs: BTreeMap<String, Value>,
    ) -> Result<Record, StoreError> {
        attrs.remove("id");
        self.check_attrs(entity, &attrs)?;
        self.widen(entity, &mut attrs);

        let current = self.table(entity)?.get(&id).cloned().ok_or_else(|| {
            StoreError::Validation {
                entity: entity.to_string(),
                message: format!("no record with id {id}"),
            }
        })?;

        let mut merged = current.attrs;
        merged.extend(attrs);
        self.check_required(entity, &merged)?;

        let record = Record { id, entity: entity.to_string(), attrs: merged };
        self.tables
            .get_mut(entity)
            .expect("checked above")
            .insert(id, record.clone());
        Ok(record)
    }

    fn delete(&mut self, entity: &str, ids: &[RecordId]) -> Result<usize, StoreError> {
        self.table(entity)?;
        let table = self.tables.get_mut(entity).expect("checked above");
        Ok(ids.iter().filter(|id| table.remove(id).is_some()).count())
    }
}

// ---------------------------------------------------------------------------
// JSON snapshot
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    tables: BTreeMap<String, Vec<Record>>,
}

impl MemoryStore {
    pub fn to_json(&self) -> Result<String, StoreError> {
        let snapshot = Snapshot {
            next_id: self.next_id,
            tables: self
                .tables
                .iter()
                .map(|(name, table)| (name.clone(), table.values().cloned().collect()))
                .collect(),
        };
        serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::Io(e.to_string()))
    }

    /// Rebuild from a snapshot, re-validating every record against the
    /// schema so a stale snapshot cannot smuggle in bad data.
    pub fn from_json(schema: Schema, input: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot =
            serde_json::from_str(input).map_err(|e| StoreError::Io(e.to_string()))?;

        let mut store = Self::new(schema);
        let mut max_id = 0;
        for (entity, records) in snapshot.tables {
            store.table(&entity)?;
            for record in records {
                store.check_attrs(&entity, &record.attrs)?;
                store.check_required(&entity, &record.attrs)?;
                max_id = max_id.max(record.id.0);
                let table = store.tables.get_mut(&entity).expect("checked above");
                if table.insert(record.id, record).is_some() {
                    return Err(StoreError::Io(format!(
                        "snapshot has duplicate id in entity '{entity}'"
                    )));
                }
            }
        }
        store.next_id = snapshot.next_id.max(max_id + 1);
        Ok(store)
    }

    pub fn load(schema: Schema, path: &Path) -> Result<Self, StoreError> {
        let input =
            std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
        Self::from_json(schema, &input)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        std::fs::write(path, self.to_json()?).map_err(|e| StoreError::Io(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
