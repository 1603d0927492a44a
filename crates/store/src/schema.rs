use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Entity schema loaded from TOML. The `belongs_to` tables form the explicit
/// association-metadata lookup the engine resolves relations through.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    pub entities: BTreeMap<String, EntityDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityDef {
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnDef>,
    #[serde(default)]
    pub belongs_to: BTreeMap<String, AssociationDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Int,
    Float,
    Bool,
    Date,
}

/// A `belongs_to` association: the related entity plus the local
/// foreign-key column holding the related record's id.
#[derive(Debug, Clone, Deserialize)]
pub struct AssociationDef {
    pub entity: String,
    /// Defaults to `<relation>_id`.
    #[serde(default)]
    pub foreign_key: String,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl Schema {
    pub fn from_toml(input: &str) -> Result<Self, StoreError> {
        let mut schema: Schema =
            toml::from_str(input).map_err(|e| StoreError::Schema(e.to_string()))?;
        schema.finalize()?;
        Ok(schema)
    }

    /// Fill in defaulted foreign keys, register them as int columns, and
    /// check that every association targets a declared entity.
    fn finalize(&mut self) -> Result<(), StoreError> {
        let entity_names: Vec<String> = self.entities.keys().cloned().collect();

        for (entity_name, entity) in &mut self.entities {
            for (relation, assoc) in &mut entity.belongs_to {
                if !entity_names.contains(&assoc.entity) {
                    return Err(StoreError::Schema(format!(
                        "entity '{entity_name}': belongs_to '{relation}' targets unknown entity '{}'",
                        assoc.entity
                    )));
                }
                if assoc.foreign_key.is_empty() {
                    assoc.foreign_key = format!("{relation}_id");
                }
                match entity.columns.get(&assoc.foreign_key) {
                    None => {
                        entity.columns.insert(
                            assoc.foreign_key.clone(),
                            ColumnDef { kind: ColumnType::Int, required: false },
                        );
                    }
                    Some(col) if col.kind != ColumnType::Int => {
                        return Err(StoreError::Schema(format!(
                            "entity '{entity_name}': foreign key column '{}' must be int",
                            assoc.foreign_key
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    pub fn entity(&self, entity: &str) -> Option<&EntityDef> {
        self.entities.get(entity)
    }

    pub fn column(&self, entity: &str, field: &str) -> Option<&ColumnDef> {
        self.entities.get(entity).and_then(|e| e.columns.get(field))
    }

    /// Association metadata for `entity.relation`, or `None` when the
    /// relation is not declared.
    pub fn association(&self, entity: &str, relation: &str) -> Option<&AssociationDef> {
        self.entities.get(entity).and_then(|e| e.belongs_to.get(relation))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
