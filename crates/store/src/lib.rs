//! `rowsync-store`: record store collaborator for the import engine.
//!
//! Owns the schema (entities, typed columns, `belongs_to` associations),
//! the scalar value model, conjunctive equality filters, and the `Store`
//! trait the engine mutates through. `MemoryStore` is the reference
//! implementation, with a JSON snapshot format for persistence.

pub mod error;
pub mod memory;
pub mod record;
pub mod schema;
pub mod store;
pub mod value;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{Filter, Record, RecordId};
pub use schema::{AssociationDef, ColumnDef, ColumnType, EntityDef, Schema};
pub use store::Store;
pub use value::Value;
